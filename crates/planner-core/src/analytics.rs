use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::money::round2;
use crate::snapshot::{AssetCategory, PlanSnapshot};
use crate::tax;
use crate::types::{with_metadata, ComputationOutput, Money, RatePct};
use crate::PlannerResult;

/// Ratio reported when annual expenses are zero (nothing to cover).
const COVERED_SENTINEL: Decimal = dec!(999);

const SNOWBALL_YEARS: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One year of the simplified wealth-snowball projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnowballYear {
    pub year: u32,
    pub portfolio_value: Money,
    pub annual_dividend: Money,
}

/// Composite portfolio health sub-scores, each 0–100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarScore {
    pub income_coverage: Decimal,
    pub leverage_safety: Decimal,
    pub diversification: Decimal,
    pub cost_cushion: Decimal,
    pub composite: Decimal,
}

/// Category breakdown against the configured allocation targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRow {
    pub category: AssetCategory,
    pub current_value: Money,
    pub current_pct: RatePct,
    pub target_pct: RatePct,
    pub target_value: Money,
    pub gap: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsOutput {
    /// Annual passive income over annual expenses, in percent.
    pub fire_ratio_pct: RatePct,
    pub radar: RadarScore,
    pub snowball: Vec<SnowballYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Vec<AllocationRow>>,
}

// ---------------------------------------------------------------------------
// Pure pieces
// ---------------------------------------------------------------------------

/// Passive-income coverage of expenses, in percent. Zero expenses report the
/// sentinel instead of dividing.
pub fn fire_ratio(annual_passive_income: Money, annual_expense: Money) -> RatePct {
    if annual_expense <= Decimal::ZERO {
        return COVERED_SENTINEL;
    }
    round2(annual_passive_income / annual_expense * dec!(100))
}

/// Ten-year geometric wealth projection: dividends reinvested at the
/// portfolio's current yield, nothing else modeled.
pub fn snowball(market_value: Money, annual_dividend: Money) -> Vec<SnowballYear> {
    let dividend_yield = if market_value > Decimal::ZERO {
        annual_dividend / market_value
    } else {
        Decimal::ZERO
    };

    let mut rows = Vec::with_capacity(SNOWBALL_YEARS as usize);
    let mut value = market_value;
    for year in 1..=SNOWBALL_YEARS {
        let dividend = value * dividend_yield;
        value += dividend;
        rows.push(SnowballYear {
            year,
            portfolio_value: round2(value),
            annual_dividend: round2(dividend),
        });
    }
    rows
}

fn clamp_score(value: Decimal) -> Decimal {
    round2(value.max(Decimal::ZERO).min(dec!(100)))
}

fn radar_score(snapshot: &PlanSnapshot, fire_pct: RatePct) -> RadarScore {
    let market_value = snapshot.total_market_value();
    let debt = snapshot.total_secured_debt();

    let income_coverage = clamp_score(fire_pct);

    let leverage_safety = if debt.is_zero() {
        dec!(100)
    } else if market_value.is_zero() {
        Decimal::ZERO
    } else {
        clamp_score((Decimal::ONE - debt / market_value) * dec!(100))
    };

    // Normalized inverse Herfindahl over the three categories: an even
    // three-way split scores 100, a single-category book scores 0.
    let diversification = if market_value.is_zero() {
        Decimal::ZERO
    } else {
        let herfindahl: Decimal = [
            AssetCategory::IncomeProducing,
            AssetCategory::Hedging,
            AssetCategory::Growth,
        ]
        .into_iter()
        .map(|cat| category_value(snapshot, cat) / market_value)
        .map(|share| share * share)
        .sum();
        let third = Decimal::ONE / dec!(3);
        clamp_score((Decimal::ONE - herfindahl) / (Decimal::ONE - third) * dec!(100))
    };

    let total_cost: Money = snapshot
        .instruments
        .iter()
        .map(|i| i.quantity * i.cost_basis)
        .sum();
    let cost_cushion = if total_cost.is_zero() {
        if market_value > Decimal::ZERO {
            dec!(100)
        } else {
            Decimal::ZERO
        }
    } else {
        clamp_score((market_value - total_cost) / total_cost * dec!(100))
    };

    let composite =
        round2((income_coverage + leverage_safety + diversification + cost_cushion) / dec!(4));

    RadarScore {
        income_coverage,
        leverage_safety,
        diversification,
        cost_cushion,
        composite,
    }
}

fn category_value(snapshot: &PlanSnapshot, category: AssetCategory) -> Money {
    snapshot
        .instruments
        .iter()
        .filter(|i| i.category == category)
        .map(|i| i.market_value())
        .sum()
}

fn allocation_report(snapshot: &PlanSnapshot) -> Option<Vec<AllocationRow>> {
    let targets = snapshot.allocation.as_ref()?;
    let market_value = snapshot.total_market_value();
    let hundred = dec!(100);

    let rows = [
        (AssetCategory::IncomeProducing, targets.income_pct),
        (AssetCategory::Hedging, targets.hedging_pct),
        (AssetCategory::Growth, targets.growth_pct),
    ]
    .into_iter()
    .map(|(category, target_pct)| {
        let current_value = category_value(snapshot, category);
        let current_pct = if market_value.is_zero() {
            Decimal::ZERO
        } else {
            round2(current_value / market_value * hundred)
        };
        let target_value = targets.total_funds * target_pct / hundred;
        AllocationRow {
            category,
            current_value,
            current_pct,
            target_pct,
            target_value,
            gap: round2(target_value - current_value),
        }
    })
    .collect();
    Some(rows)
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Derived analytics over one snapshot: FIRE ratio, radar sub-scores,
/// ten-year snowball, and the allocation-target breakdown when configured.
pub fn analyze(snapshot: &PlanSnapshot) -> PlannerResult<ComputationOutput<AnalyticsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    snapshot.validate()?;

    let annual_dividend = tax::total_annual_dividend(&snapshot.instruments);
    let annual_expense = snapshot.tax_status.monthly_expense * dec!(12);
    let fire = fire_ratio(annual_dividend, annual_expense);
    if annual_expense.is_zero() {
        warnings.push("Zero living expenses: FIRE ratio reported as sentinel 999".into());
    }

    let output = AnalyticsOutput {
        fire_ratio_pct: fire,
        radar: radar_score(snapshot, fire),
        snowball: snowball(snapshot.total_market_value(), annual_dividend),
        allocation: allocation_report(snapshot),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Derived analytics (FIRE ratio, radar score, wealth snowball, allocation targets)",
        &serde_json::json!({
            "snowball_years": SNOWBALL_YEARS,
            "reinvestment": "dividends reinvested at current portfolio yield",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        AllocationTargets, DistributionMode, EngineConfig, Instrument, TaxStatus,
    };
    use rust_decimal_macros::dec;

    fn instrument(category: AssetCategory, value: Decimal) -> Instrument {
        Instrument {
            id: format!("{category:?}"),
            name: format!("{category:?}"),
            category,
            quantity: dec!(1),
            cost_basis: value,
            current_price: value,
            dividend_rate: dec!(0),
            distribution_mode: DistributionMode::AnnualTotal,
            distribution_months: vec![],
            margin_balance: None,
            margin_rate_pct: None,
            lots: None,
        }
    }

    fn snapshot(instruments: Vec<Instrument>) -> PlanSnapshot {
        PlanSnapshot {
            instruments,
            mortgages: vec![],
            collateral_loan: None,
            margin_loan: None,
            consumer_loan: None,
            tax_status: TaxStatus {
                salary: dec!(0),
                dependents: 0,
                has_spouse: false,
                has_disability: false,
                monthly_expense: dec!(25_000),
            },
            allocation: None,
            config: EngineConfig::default(),
        }
    }

    #[test]
    fn test_fire_ratio_basic() {
        assert_eq!(fire_ratio(dec!(150_000), dec!(300_000)), dec!(50));
        assert_eq!(fire_ratio(dec!(300_000), dec!(300_000)), dec!(100));
    }

    #[test]
    fn test_fire_ratio_zero_expense_sentinel() {
        assert_eq!(fire_ratio(dec!(1), Decimal::ZERO), dec!(999));
    }

    #[test]
    fn test_snowball_compounds_at_current_yield() {
        // 1M portfolio, 50k dividend -> 5% yield, ten years.
        let rows = snowball(dec!(1_000_000), dec!(50_000));
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].annual_dividend, dec!(50_000));
        assert_eq!(rows[0].portfolio_value, dec!(1_050_000));
        assert_eq!(rows[1].annual_dividend, dec!(52_500));
        // Value strictly grows.
        for pair in rows.windows(2) {
            assert!(pair[1].portfolio_value > pair[0].portfolio_value);
        }
    }

    #[test]
    fn test_snowball_empty_portfolio() {
        let rows = snowball(Decimal::ZERO, Decimal::ZERO);
        assert!(rows.iter().all(|r| r.portfolio_value.is_zero()));
    }

    #[test]
    fn test_diversification_even_split_scores_full() {
        let snap = snapshot(vec![
            instrument(AssetCategory::IncomeProducing, dec!(100)),
            instrument(AssetCategory::Hedging, dec!(100)),
            instrument(AssetCategory::Growth, dec!(100)),
        ]);
        let out = analyze(&snap).unwrap().result;
        assert_eq!(out.radar.diversification, dec!(100));
    }

    #[test]
    fn test_diversification_single_category_scores_zero() {
        let snap = snapshot(vec![instrument(AssetCategory::Growth, dec!(300))]);
        let out = analyze(&snap).unwrap().result;
        assert_eq!(out.radar.diversification, Decimal::ZERO);
        // No debt: full leverage-safety score.
        assert_eq!(out.radar.leverage_safety, dec!(100));
    }

    #[test]
    fn test_allocation_report_gaps() {
        let mut snap = snapshot(vec![
            instrument(AssetCategory::IncomeProducing, dec!(600_000)),
            instrument(AssetCategory::Growth, dec!(400_000)),
        ]);
        snap.allocation = Some(AllocationTargets {
            total_funds: dec!(1_000_000),
            income_pct: dec!(50),
            hedging_pct: dec!(20),
            growth_pct: dec!(30),
        });
        let rows = analyze(&snap).unwrap().result.allocation.unwrap();
        assert_eq!(rows[0].target_value, dec!(500_000));
        assert_eq!(rows[0].gap, dec!(-100_000));
        assert_eq!(rows[1].current_value, Decimal::ZERO);
        assert_eq!(rows[1].gap, dec!(200_000));
        assert_eq!(rows[2].current_pct, dec!(40));
    }

    #[test]
    fn test_empty_snapshot_is_all_guards_no_panic() {
        let snap = snapshot(vec![]);
        let out = analyze(&snap).unwrap().result;
        assert_eq!(out.radar.diversification, Decimal::ZERO);
        assert_eq!(out.radar.leverage_safety, dec!(100));
        assert_eq!(out.fire_ratio_pct, Decimal::ZERO);
    }
}
