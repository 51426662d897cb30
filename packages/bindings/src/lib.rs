use napi::Result as NapiResult;
use napi_derive::napi;

use planner_core::snapshot::PlanSnapshot;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Deserialize, normalize, and validate a snapshot before it reaches the
/// engine. Defaulting of missing optional fields happens in serde; the
/// engine itself only sees fully-populated snapshots.
fn load_snapshot(snapshot_json: &str) -> NapiResult<PlanSnapshot> {
    let mut snapshot: PlanSnapshot =
        serde_json::from_str(snapshot_json).map_err(to_napi_error)?;
    snapshot.normalize(chrono::Local::now().date_naive());
    snapshot.validate().map_err(to_napi_error)?;
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Cash-flow projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project_cash_flow(snapshot_json: String) -> NapiResult<String> {
    let snapshot = load_snapshot(&snapshot_json)?;
    let output = planner_core::projection::project(&snapshot).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Stress test
// ---------------------------------------------------------------------------

#[napi]
pub fn run_stress_test(snapshot_json: String) -> NapiResult<String> {
    let snapshot = load_snapshot(&snapshot_json)?;
    let output = planner_core::stress::stress_test(&snapshot).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Income tax
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_income_tax(snapshot_json: String) -> NapiResult<String> {
    let snapshot = load_snapshot(&snapshot_json)?;
    let dividend = planner_core::tax::total_annual_dividend(&snapshot.instruments);
    let output =
        planner_core::tax::income_tax(&snapshot.tax_status, dividend).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Derived analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_analytics(snapshot_json: String) -> NapiResult<String> {
    let snapshot = load_snapshot(&snapshot_json)?;
    let output = planner_core::analytics::analyze(&snapshot).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
