use clap::Args;
use serde_json::Value;

use planner_core::stress;

use crate::input;

/// Arguments for the margin-call stress test
#[derive(Args)]
pub struct StressArgs {
    /// Path to a JSON snapshot file (or pipe the snapshot on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_stress(args: StressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.input.as_deref())?;
    let result = stress::stress_test(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}
