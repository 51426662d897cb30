use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::money;
use crate::types::{Money, RatePct};
use crate::PlannerResult;

// ---------------------------------------------------------------------------
// Instruments
// ---------------------------------------------------------------------------

/// Allocation category. Used only for allocation reporting, never for
/// cash-flow math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    #[default]
    IncomeProducing,
    Hedging,
    Growth,
}

/// How the dividend rate is quoted.
///
/// `AnnualTotal`: rate is the full-year amount per unit; each distribution
/// pays (quantity x rate) / distribution count.
/// `PerDistribution`: rate is paid in full at every distribution month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    #[default]
    AnnualTotal,
    PerDistribution,
}

/// A single purchase lot. Quantity and cost basis on the instrument are
/// derived from these when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub quantity: Decimal,
    pub price: Money,
    #[serde(default)]
    pub fee: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// A dividend-bearing asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: AssetCategory,
    pub quantity: Decimal,
    pub cost_basis: Money,
    pub current_price: Money,
    pub dividend_rate: Money,
    #[serde(default)]
    pub distribution_mode: DistributionMode,
    #[serde(default)]
    pub distribution_months: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_balance: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_rate_pct: Option<RatePct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lots: Option<Vec<Lot>>,
}

impl Instrument {
    /// Cash paid out per unit-holding in one distribution month.
    pub fn per_distribution_payout(&self) -> Money {
        let gross = self.quantity * self.dividend_rate;
        match self.distribution_mode {
            DistributionMode::AnnualTotal => {
                let count = Decimal::from(self.distribution_months.len().max(1) as u32);
                gross / count
            }
            DistributionMode::PerDistribution => gross,
        }
    }

    /// Full-year dividend for this holding.
    pub fn annual_dividend(&self) -> Money {
        let gross = self.quantity * self.dividend_rate;
        match self.distribution_mode {
            DistributionMode::AnnualTotal => gross,
            DistributionMode::PerDistribution => {
                gross * Decimal::from(self.distribution_months.len() as u32)
            }
        }
    }

    pub fn market_value(&self) -> Money {
        self.quantity * self.current_price
    }

    pub fn pays_in_month(&self, month: u32) -> bool {
        self.distribution_months.contains(&month)
    }

    pub fn margin_rate_or_default(&self, config: &EngineConfig) -> RatePct {
        self.margin_rate_pct
            .unwrap_or(config.default_margin_rate_pct)
    }
}

/// Recompute (quantity, weighted-average cost basis) from a lot list.
/// Cost basis includes fees and is rounded to 2 decimal places.
/// An empty list derives a flat (0, 0) holding.
pub fn derive_from_lots(lots: &[Lot]) -> (Decimal, Money) {
    let quantity: Decimal = lots.iter().map(|l| l.quantity).sum();
    if quantity.is_zero() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let total_cost: Money = lots.iter().map(|l| l.quantity * l.price + l.fee).sum();
    (quantity, money::round2(total_cost / quantity))
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Repayment convention for an amortizing loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    /// Fixed total payment; interest portion shrinks over time.
    #[default]
    LevelPayment,
    /// Fixed principal portion; total payment declines over time.
    EqualPrincipal,
}

/// An amortizing mortgage with a two-tier rate and an interest-only grace
/// period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mortgage {
    pub principal: Money,
    pub total_months: u32,
    #[serde(default)]
    pub elapsed_months: u32,
    /// Annual rate in percent points, applied through `rate1_months`.
    pub rate1_pct: RatePct,
    /// Annual rate in percent points, applied after `rate1_months`.
    pub rate2_pct: RatePct,
    pub rate1_months: u32,
    #[serde(default)]
    pub grace_months: u32,
    #[serde(default)]
    pub method: RepaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Flat-rate consumer loan, always level-payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerLoan {
    pub principal: Money,
    pub rate_pct: RatePct,
    pub total_months: u32,
    #[serde(default)]
    pub elapsed_months: u32,
}

/// Interest-only borrowing against pledged collateral (stock-secured or
/// brokerage margin). Principal never amortizes; a maintenance-ratio breach
/// triggers a margin call instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuredLoan {
    pub principal: Money,
    pub rate_pct: RatePct,
    #[serde(default = "default_maintenance_threshold")]
    pub maintenance_threshold_pct: RatePct,
}

fn default_maintenance_threshold() -> RatePct {
    dec!(130)
}

// ---------------------------------------------------------------------------
// Household & configuration
// ---------------------------------------------------------------------------

/// Household composition and fixed expenses for the tax computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxStatus {
    pub salary: Money,
    #[serde(default)]
    pub dependents: u32,
    #[serde(default)]
    pub has_spouse: bool,
    #[serde(default)]
    pub has_disability: bool,
    pub monthly_expense: Money,
}

impl TaxStatus {
    /// Self + spouse (if any) + dependents.
    pub fn headcount(&self) -> u32 {
        1 + u32::from(self.has_spouse) + self.dependents
    }
}

/// Allocation targets for the three asset categories, in percent points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationTargets {
    pub total_funds: Money,
    pub income_pct: RatePct,
    pub hedging_pct: RatePct,
    pub growth_pct: RatePct,
}

/// Engine-wide constants, injected rather than hidden in modules so the
/// engine stays a pure function of its full input. Defaults follow the 2023
/// Taiwan NHI supplemental-premium rules and common brokerage terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annual rate charged on per-instrument margin balances that carry none.
    pub default_margin_rate_pct: RatePct,
    /// Single-distribution payout above this amount triggers the surcharge.
    pub surcharge_threshold: Money,
    /// Surcharge rate applied to the entire payout once triggered.
    pub surcharge_rate: Decimal,
    /// Brokerage fee rate applied to buy-lot notionals.
    pub brokerage_fee_rate: Decimal,
    /// Month (1-12) in which the full annual income tax is withheld.
    pub tax_withholding_month: u32,
    /// Maintenance threshold used when no secured loan states one.
    pub default_maintenance_threshold_pct: RatePct,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_margin_rate_pct: dec!(6),
            surcharge_threshold: dec!(20_000),
            surcharge_rate: dec!(0.0211),
            brokerage_fee_rate: dec!(0.001425),
            tax_withholding_month: 5,
            default_maintenance_threshold_pct: dec!(130),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One complete, read-only view of the household's finances. The engine
/// never mutates a snapshot and never retains one across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub mortgages: Vec<Mortgage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_loan: Option<SecuredLoan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_loan: Option<SecuredLoan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_loan: Option<ConsumerLoan>,
    pub tax_status: TaxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationTargets>,
    #[serde(default)]
    pub config: EngineConfig,
}

impl PlanSnapshot {
    /// Structural validation. The engine assumes a snapshot that passed this
    /// check; loaders must default missing optional fields before it runs.
    pub fn validate(&self) -> PlannerResult<()> {
        for inst in &self.instruments {
            if inst.quantity < Decimal::ZERO {
                return Err(invalid(&inst.id, "quantity must be >= 0"));
            }
            if inst.current_price < Decimal::ZERO {
                return Err(invalid(&inst.id, "current_price must be >= 0"));
            }
            if inst.dividend_rate < Decimal::ZERO {
                return Err(invalid(&inst.id, "dividend_rate must be >= 0"));
            }
            if let Some(balance) = inst.margin_balance {
                if balance < Decimal::ZERO {
                    return Err(invalid(&inst.id, "margin_balance must be >= 0"));
                }
            }
            let mut seen = [false; 13];
            for &m in &inst.distribution_months {
                if !(1..=12).contains(&m) {
                    return Err(invalid(&inst.id, "distribution month outside 1..=12"));
                }
                if seen[m as usize] {
                    return Err(invalid(&inst.id, "duplicate distribution month"));
                }
                seen[m as usize] = true;
            }
        }
        for (i, mtg) in self.mortgages.iter().enumerate() {
            if mtg.principal < Decimal::ZERO {
                return Err(invalid(&format!("mortgages[{i}]"), "principal must be >= 0"));
            }
            if mtg.total_months == 0 {
                return Err(invalid(&format!("mortgages[{i}]"), "total_months must be > 0"));
            }
        }
        if let Some(loan) = &self.consumer_loan {
            if loan.principal < Decimal::ZERO {
                return Err(invalid("consumer_loan", "principal must be >= 0"));
            }
            if loan.total_months == 0 {
                return Err(invalid("consumer_loan", "total_months must be > 0"));
            }
        }
        for (name, loan) in [
            ("collateral_loan", &self.collateral_loan),
            ("margin_loan", &self.margin_loan),
        ] {
            if let Some(loan) = loan {
                if loan.principal < Decimal::ZERO {
                    return Err(invalid(name, "principal must be >= 0"));
                }
                if loan.maintenance_threshold_pct <= Decimal::ZERO {
                    return Err(invalid(name, "maintenance_threshold_pct must be > 0"));
                }
            }
        }
        if self.tax_status.salary < Decimal::ZERO {
            return Err(invalid("tax_status.salary", "must be >= 0"));
        }
        if self.tax_status.monthly_expense < Decimal::ZERO {
            return Err(invalid("tax_status.monthly_expense", "must be >= 0"));
        }
        if !(1..=12).contains(&self.config.tax_withholding_month) {
            return Err(invalid("config.tax_withholding_month", "must be in 1..=12"));
        }
        Ok(())
    }

    /// Load-time normalization: re-derive quantity/cost basis from lots, and
    /// recompute mortgage elapsed months from origination dates.
    ///
    /// Month indexing stays loan-relative afterwards: projection month 1 is
    /// treated as loan month elapsed+1, not as a calendar month. Downstream
    /// paid-month counters rely on the same simplification.
    pub fn normalize(&mut self, today: NaiveDate) {
        for inst in &mut self.instruments {
            if let Some(lots) = &inst.lots {
                let (quantity, cost_basis) = derive_from_lots(lots);
                inst.quantity = quantity;
                inst.cost_basis = cost_basis;
            }
        }
        for mtg in &mut self.mortgages {
            if let Some(start) = mtg.start_date {
                mtg.elapsed_months = whole_months_between(start, today);
            }
        }
    }

    /// Sum of quantity x current price over all instruments.
    pub fn total_market_value(&self) -> Money {
        self.instruments.iter().map(Instrument::market_value).sum()
    }

    /// Collateral principal + margin principal + per-instrument balances.
    pub fn total_secured_debt(&self) -> Money {
        let loans = self.collateral_loan.iter().chain(self.margin_loan.iter());
        let loan_debt: Money = loans.map(|l| l.principal).sum();
        let instrument_debt: Money = self
            .instruments
            .iter()
            .filter_map(|i| i.margin_balance)
            .sum();
        loan_debt + instrument_debt
    }

    /// Maintenance threshold: collateral loan's if present, else margin
    /// loan's, else the configured default.
    pub fn maintenance_threshold(&self) -> RatePct {
        self.collateral_loan
            .as_ref()
            .or(self.margin_loan.as_ref())
            .map(|l| l.maintenance_threshold_pct)
            .unwrap_or(self.config.default_maintenance_threshold_pct)
    }
}

fn invalid(field: &str, reason: &str) -> PlannerError {
    PlannerError::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Whole calendar months from `start` to `today`, floored at zero. Day-of-month
/// is ignored; a loan started on Jan 31 and viewed on Feb 1 counts one month.
fn whole_months_between(start: NaiveDate, today: NaiveDate) -> u32 {
    let months = (today.year() - start.year()) * 12 + (today.month() as i32 - start.month() as i32);
    months.max(0) as u32
}
