use clap::Args;
use serde_json::Value;

use planner_core::projection;

use crate::input;

/// Arguments for the 12-month cash-flow projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON snapshot file (or pipe the snapshot on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.input.as_deref())?;
    let result = projection::project(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}
