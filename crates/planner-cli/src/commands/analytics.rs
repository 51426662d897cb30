use clap::Args;
use serde_json::Value;

use planner_core::analytics;

use crate::input;

/// Arguments for derived analytics
#[derive(Args)]
pub struct AnalyticsArgs {
    /// Path to a JSON snapshot file (or pipe the snapshot on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analytics(args: AnalyticsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.input.as_deref())?;
    let result = analytics::analyze(&snapshot)?;
    Ok(serde_json::to_value(result)?)
}
