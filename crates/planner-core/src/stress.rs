use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::money::round2;
use crate::snapshot::PlanSnapshot;
use crate::types::{with_metadata, ComputationOutput, Money, RatePct};
use crate::PlannerResult;

/// Uniform drawdowns applied to every holding, in percent points.
const DRAWDOWN_STEPS_PCT: [Decimal; 9] = [
    dec!(0),
    dec!(5),
    dec!(10),
    dec!(15),
    dec!(20),
    dec!(25),
    dec!(30),
    dec!(35),
    dec!(40),
];

/// Maintenance ratio reported when there is no debt to maintain against.
pub const NO_DEBT_RATIO: Decimal = dec!(999);

/// Portfolio state at one hypothetical drawdown level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressRow {
    pub drawdown_pct: RatePct,
    pub residual_price_pct: RatePct,
    pub residual_value: Money,
    pub maintenance_ratio: RatePct,
    pub margin_call: bool,
    pub required_top_up: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestOutput {
    pub total_debt: Money,
    pub total_market_value: Money,
    pub maintenance_threshold_pct: RatePct,
    pub rows: Vec<StressRow>,
}

/// Margin-call stress test: portfolio maintenance ratio under uniform price
/// drawdowns of 0–40% in 5-point steps.
///
/// With zero total debt the ratio is the `NO_DEBT_RATIO` sentinel and no
/// level can trigger a call. The top-up is the debt reduction that restores
/// the ratio exactly to the threshold.
pub fn stress_test(snapshot: &PlanSnapshot) -> PlannerResult<ComputationOutput<StressTestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    snapshot.validate()?;

    let total_debt = snapshot.total_secured_debt();
    let total_market_value = snapshot.total_market_value();
    let threshold = snapshot.maintenance_threshold();

    if total_debt.is_zero() {
        warnings.push("No secured debt: maintenance ratio reported as sentinel 999".into());
    }

    let hundred = dec!(100);
    let threshold_fraction = threshold / hundred;

    let rows = DRAWDOWN_STEPS_PCT
        .iter()
        .map(|&drawdown| {
            let residual_price_pct = hundred - drawdown;
            let residual_value = total_market_value * residual_price_pct / hundred;

            let maintenance_ratio = if total_debt.is_zero() {
                NO_DEBT_RATIO
            } else {
                round2(residual_value / total_debt * hundred)
            };

            let margin_call = total_debt > Decimal::ZERO && maintenance_ratio < threshold;
            let required_top_up = if margin_call {
                (total_debt - residual_value / threshold_fraction).max(Decimal::ZERO)
            } else {
                Decimal::ZERO
            };

            StressRow {
                drawdown_pct: drawdown,
                residual_price_pct,
                residual_value,
                maintenance_ratio,
                margin_call,
                required_top_up: round2(required_top_up),
            }
        })
        .collect();

    let output = StressTestOutput {
        total_debt,
        total_market_value,
        maintenance_threshold_pct: threshold,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Uniform-drawdown margin stress test (maintenance ratio and required top-up)",
        &serde_json::json!({
            "drawdown_steps_pct": DRAWDOWN_STEPS_PCT.map(|d| d.to_string()),
            "maintenance_threshold_pct": threshold.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
