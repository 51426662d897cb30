pub mod file;
pub mod stdin;

use planner_core::snapshot::PlanSnapshot;

/// Load a snapshot from `--input <file>` or piped stdin, apply load-time
/// normalization (lot-derived holdings, origination-date elapsed months),
/// and validate before anything reaches the engine.
pub fn load_snapshot(path: Option<&str>) -> Result<PlanSnapshot, Box<dyn std::error::Error>> {
    let mut snapshot: PlanSnapshot = if let Some(path) = path {
        file::read_json(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("a snapshot is required: pass --input <file> or pipe JSON on stdin".into());
    };

    snapshot.normalize(chrono::Local::now().date_naive());
    snapshot.validate()?;
    Ok(snapshot)
}
