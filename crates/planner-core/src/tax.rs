use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::snapshot::{EngineConfig, Instrument, TaxStatus};
use crate::types::Money;
use crate::PlannerResult;

// ---------------------------------------------------------------------------
// Tax-year constants (Taiwan individual income tax, tax year 2023)
// ---------------------------------------------------------------------------

/// Personal exemption per head (self + spouse + dependents).
const PERSONAL_EXEMPTION: Decimal = dec!(92_000);
/// Standard deduction, single filer.
const STANDARD_DEDUCTION_SINGLE: Decimal = dec!(124_000);
/// Standard deduction, married filing jointly.
const STANDARD_DEDUCTION_MARRIED: Decimal = dec!(248_000);
/// Salary special deduction cap.
const SALARY_DEDUCTION_CAP: Decimal = dec!(207_000);
/// Disability special deduction.
const DISABILITY_DEDUCTION: Decimal = dec!(207_000);
/// Basic living expense per head; the differential over claimed deductions
/// is itself deductible.
const BASIC_LIVING_PER_HEAD: Decimal = dec!(202_000);
/// Dividend tax credit: 8.5% of gross dividend, capped.
const DIVIDEND_CREDIT_RATE: Decimal = dec!(0.085);
const DIVIDEND_CREDIT_CAP: Decimal = dec!(80_000);

/// Progressive brackets: (upper bound, marginal rate, progressive difference).
/// The subtractor encodes the cumulative tax of all lower brackets, so
/// tax = taxable * rate - subtractor is continuous at every boundary.
const BRACKETS: [(Decimal, Decimal, Decimal); 5] = [
    (dec!(560_000), dec!(0.05), dec!(0)),
    (dec!(1_260_000), dec!(0.12), dec!(39_200)),
    (dec!(2_520_000), dec!(0.20), dec!(140_000)),
    (dec!(4_720_000), dec!(0.30), dec!(392_000)),
    (Decimal::MAX, dec!(0.40), dec!(864_000)),
];

// ---------------------------------------------------------------------------
// Dividend aggregation
// ---------------------------------------------------------------------------

/// Full-year dividend income across the portfolio.
pub fn total_annual_dividend(instruments: &[Instrument]) -> Money {
    instruments.iter().map(Instrument::annual_dividend).sum()
}

/// NHI supplemental premium on one distribution payout. Once the payout
/// clears the threshold the entire payout is charged, not just the excess.
pub fn surcharge_on_payout(payout: Money, config: &EngineConfig) -> Money {
    if payout > config.surcharge_threshold {
        payout * config.surcharge_rate
    } else {
        Decimal::ZERO
    }
}

/// Annual NHI supplemental premium: per instrument, the single-distribution
/// payout is tested against the threshold; a hit charges the whole annual
/// dividend of that instrument.
pub fn health_surcharge(instruments: &[Instrument], config: &EngineConfig) -> Money {
    instruments
        .iter()
        .filter(|i| !i.distribution_months.is_empty())
        .map(|i| {
            let annual = i.annual_dividend();
            let single = annual / Decimal::from(i.distribution_months.len() as u32);
            if single > config.surcharge_threshold {
                annual * config.surcharge_rate
            } else {
                Decimal::ZERO
            }
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Progressive income tax
// ---------------------------------------------------------------------------

/// Result of the annual income-tax computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxOutput {
    pub payable_tax: Money,
    pub net_taxable_income: Money,
    pub marginal_rate: Decimal,
    pub deductions: DeductionBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub exemption: Money,
    pub standard_deduction: Money,
    pub salary_deduction: Money,
    pub disability_deduction: Money,
    pub basic_living_differential: Money,
    pub dividend_credit: Money,
}

/// Annual progressive income tax on salary + gross dividends for one
/// household. No refunds are modeled: payable tax floors at zero.
pub fn income_tax(status: &TaxStatus, gross_dividend: Money) -> PlannerResult<IncomeTaxOutput> {
    let headcount = Decimal::from(status.headcount());

    let exemption = PERSONAL_EXEMPTION * headcount;
    let standard_deduction = if status.has_spouse {
        STANDARD_DEDUCTION_MARRIED
    } else {
        STANDARD_DEDUCTION_SINGLE
    };
    let salary_deduction = status.salary.min(SALARY_DEDUCTION_CAP);
    let disability_deduction = if status.has_disability {
        DISABILITY_DEDUCTION
    } else {
        Decimal::ZERO
    };
    let basic_living_differential = (BASIC_LIVING_PER_HEAD * headcount
        - (exemption + standard_deduction + disability_deduction))
        .max(Decimal::ZERO);

    let net_taxable = (status.salary + gross_dividend
        - exemption
        - standard_deduction
        - salary_deduction
        - disability_deduction
        - basic_living_differential)
        .max(Decimal::ZERO);

    let (rate, subtractor) = bracket_for(net_taxable);
    let bracket_tax = net_taxable * rate - subtractor;

    let dividend_credit = (gross_dividend * DIVIDEND_CREDIT_RATE).min(DIVIDEND_CREDIT_CAP);
    let payable = (bracket_tax - dividend_credit).max(Decimal::ZERO);

    Ok(IncomeTaxOutput {
        payable_tax: payable,
        net_taxable_income: net_taxable,
        marginal_rate: rate,
        deductions: DeductionBreakdown {
            exemption,
            standard_deduction,
            salary_deduction,
            disability_deduction,
            basic_living_differential,
            dividend_credit,
        },
    })
}

/// Rate and progressive difference for the bracket containing `taxable`.
fn bracket_for(taxable: Money) -> (Decimal, Decimal) {
    for (upper, rate, subtractor) in BRACKETS {
        if taxable <= upper {
            return (rate, subtractor);
        }
    }
    let (_, rate, subtractor) = BRACKETS[BRACKETS.len() - 1];
    (rate, subtractor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{AssetCategory, DistributionMode};
    use rust_decimal_macros::dec;

    fn status(salary: Decimal) -> TaxStatus {
        TaxStatus {
            salary,
            dependents: 0,
            has_spouse: false,
            has_disability: false,
            monthly_expense: dec!(30_000),
        }
    }

    fn instrument(rate: Decimal, months: Vec<u32>, mode: DistributionMode) -> Instrument {
        Instrument {
            id: "x".into(),
            name: "x".into(),
            category: AssetCategory::IncomeProducing,
            quantity: dec!(10_000),
            cost_basis: dec!(20),
            current_price: dec!(35),
            dividend_rate: rate,
            distribution_mode: mode,
            distribution_months: months,
            margin_balance: None,
            margin_rate_pct: None,
            lots: None,
        }
    }

    #[test]
    fn test_total_annual_dividend_both_modes() {
        let annual = instrument(dec!(2.8), vec![1, 4, 7, 10], DistributionMode::AnnualTotal);
        let per = instrument(dec!(0.5), vec![3, 6, 9, 12], DistributionMode::PerDistribution);
        // 10_000*2.8 + 10_000*0.5*4
        assert_eq!(total_annual_dividend(&[annual, per]), dec!(48_000));
    }

    #[test]
    fn test_single_filer_below_exemptions_pays_nothing() {
        let out = income_tax(&status(dec!(300_000)), Decimal::ZERO).unwrap();
        assert_eq!(out.net_taxable_income, Decimal::ZERO);
        assert_eq!(out.payable_tax, Decimal::ZERO);
    }

    #[test]
    fn test_basic_living_differential_single_filer() {
        // Single, no disability: 202_000 - (92_000 + 124_000) < 0 -> no differential
        let out = income_tax(&status(dec!(800_000)), Decimal::ZERO).unwrap();
        assert_eq!(out.deductions.basic_living_differential, Decimal::ZERO);
        // Family of four: 808_000 - (368_000 + 248_000) = 192_000
        let family = TaxStatus {
            salary: dec!(1_200_000),
            dependents: 2,
            has_spouse: true,
            has_disability: false,
            monthly_expense: dec!(60_000),
        };
        let out = income_tax(&family, Decimal::ZERO).unwrap();
        assert_eq!(out.deductions.basic_living_differential, dec!(192_000));
    }

    #[test]
    fn test_bracket_continuity_at_boundaries() {
        // Construct salaries that land exactly at and just past each boundary
        // after deductions; the progressive difference must keep total tax
        // continuous (jump bounded by the marginal rate on one unit).
        let deductions = dec!(92_000) + dec!(124_000) + dec!(207_000);
        for boundary in [dec!(560_000), dec!(1_260_000), dec!(2_520_000), dec!(4_720_000)] {
            let at = income_tax(&status(boundary + deductions), Decimal::ZERO).unwrap();
            let past = income_tax(&status(boundary + deductions + dec!(1)), Decimal::ZERO).unwrap();
            assert_eq!(at.net_taxable_income, boundary);
            assert!(past.payable_tax >= at.payable_tax);
            assert!(past.payable_tax - at.payable_tax <= dec!(0.40));
        }
    }

    #[test]
    fn test_tax_monotone_in_income() {
        let mut last = Decimal::ZERO;
        for salary in (0..60).map(|i| Decimal::from(i * 100_000)) {
            let out = income_tax(&status(salary), Decimal::ZERO).unwrap();
            assert!(out.payable_tax >= last, "tax regressed at salary {salary}");
            last = out.payable_tax;
        }
    }

    #[test]
    fn test_dividend_credit_capped() {
        // 8.5% of 2_000_000 = 170_000, capped at 80_000.
        let out = income_tax(&status(dec!(1_000_000)), dec!(2_000_000)).unwrap();
        assert_eq!(out.deductions.dividend_credit, dec!(80_000));
    }

    #[test]
    fn test_credit_never_produces_refund() {
        // Tiny salary, large credit-bearing dividend under the cap.
        let out = income_tax(&status(dec!(0)), dec!(500_000)).unwrap();
        assert!(out.payable_tax >= Decimal::ZERO);
    }

    #[test]
    fn test_surcharge_charges_entire_payout_not_excess() {
        let config = EngineConfig::default();
        assert_eq!(surcharge_on_payout(dec!(20_000), &config), Decimal::ZERO);
        // 20_001 crosses the threshold: 2.11% of the whole payout.
        assert_eq!(
            surcharge_on_payout(dec!(20_001), &config),
            dec!(20_001) * dec!(0.0211)
        );
    }

    #[test]
    fn test_annual_surcharge_tested_per_distribution() {
        let config = EngineConfig::default();
        // Annual 60_000 over 4 distributions -> 15_000 each, under threshold.
        let quarterly = instrument(dec!(6), vec![1, 4, 7, 10], DistributionMode::AnnualTotal);
        assert_eq!(health_surcharge(&[quarterly], &config), Decimal::ZERO);
        // Same annual amount in one distribution -> whole 60_000 charged.
        let lump = instrument(dec!(6), vec![7], DistributionMode::AnnualTotal);
        assert_eq!(
            health_surcharge(&[lump], &config),
            dec!(60_000) * dec!(0.0211)
        );
    }
}
