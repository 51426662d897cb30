use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortize;
use crate::money::round2;
use crate::snapshot::PlanSnapshot;
use crate::tax;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::PlannerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of household cash flow. All amounts are non-negative except
/// `net_flow` and `cumulative`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub month: u32,
    pub dividend_income: Money,
    pub mortgage_payment: Money,
    pub consumer_payment: Money,
    pub margin_interest: Money,
    pub health_surcharge: Money,
    pub income_tax_withheld: Money,
    pub living_expense: Money,
    pub net_flow: Money,
    pub cumulative: Money,
}

/// Full-year aggregates reconciling the monthly pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub total_dividend: Money,
    pub total_loan_outflow: Money,
    pub total_health_surcharge: Money,
    pub income_tax_payable: Money,
    pub net_taxable_income: Money,
    pub marginal_rate: Decimal,
    /// Month-12 cumulative balance. Income tax is already withheld inside
    /// the monthly pass, so no second subtraction happens here.
    pub year_end_net: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub monthly: Vec<MonthlyRow>,
    pub annual: AnnualSummary,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project twelve months of household cash flow from one snapshot.
///
/// Per month: dividend inflows by distribution-month membership, loan
/// outflows (mortgages, consumer loan, interest-only margin/collateral
/// charges), the per-payout health surcharge, fixed living expenses, and the
/// full annual income tax withheld once in the configured filing month.
pub fn project(snapshot: &PlanSnapshot) -> PlannerResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    snapshot.validate()?;

    let gross_dividend = tax::total_annual_dividend(&snapshot.instruments);
    let tax_out = tax::income_tax(&snapshot.tax_status, gross_dividend)?;

    for (i, mtg) in snapshot.mortgages.iter().enumerate() {
        if mtg.grace_months >= mtg.total_months {
            warnings.push(format!(
                "mortgages[{i}]: grace period covers the whole term; no principal is ever repaid"
            ));
        }
        if mtg.rate1_months > mtg.total_months {
            warnings.push(format!(
                "mortgages[{i}]: rate1_months exceeds the term; rate2 never applies"
            ));
        }
    }

    let mut monthly = Vec::with_capacity(12);
    let mut cumulative = Decimal::ZERO;
    let mut total_loan_outflow = Decimal::ZERO;
    let mut total_surcharge = Decimal::ZERO;

    for month in 1..=12u32 {
        let mut dividend_income = Decimal::ZERO;
        let mut health_surcharge = Decimal::ZERO;
        for inst in snapshot.instruments.iter().filter(|i| i.pays_in_month(month)) {
            let payout = inst.per_distribution_payout();
            dividend_income += payout;
            health_surcharge += tax::surcharge_on_payout(payout, &snapshot.config);
        }
        dividend_income = round2(dividend_income);
        health_surcharge = round2(health_surcharge);

        let mut mortgage_payment = Decimal::ZERO;
        for mtg in &snapshot.mortgages {
            mortgage_payment += amortize::monthly_payment(mtg, month)?;
        }

        let consumer_payment = match &snapshot.consumer_loan {
            Some(loan) => amortize::consumer_loan_payment(loan, month)?,
            None => Decimal::ZERO,
        };

        let mut margin_interest = Decimal::ZERO;
        for loan in snapshot
            .collateral_loan
            .iter()
            .chain(snapshot.margin_loan.iter())
        {
            margin_interest += amortize::interest_only(loan.principal, loan.rate_pct);
        }
        for inst in &snapshot.instruments {
            if let Some(balance) = inst.margin_balance {
                margin_interest +=
                    amortize::interest_only(balance, inst.margin_rate_or_default(&snapshot.config));
            }
        }

        let income_tax_withheld = if month == snapshot.config.tax_withholding_month {
            tax_out.payable_tax
        } else {
            Decimal::ZERO
        };

        let living_expense = snapshot.tax_status.monthly_expense;
        let outflow = mortgage_payment
            + consumer_payment
            + margin_interest
            + health_surcharge
            + income_tax_withheld
            + living_expense;
        let net_flow = dividend_income - outflow;
        cumulative += net_flow;

        total_loan_outflow += mortgage_payment + consumer_payment + margin_interest;
        total_surcharge += health_surcharge;

        monthly.push(MonthlyRow {
            month,
            dividend_income,
            mortgage_payment,
            consumer_payment,
            margin_interest,
            health_surcharge,
            income_tax_withheld,
            living_expense,
            net_flow,
            cumulative,
        });
    }

    let annual = AnnualSummary {
        total_dividend: gross_dividend,
        total_loan_outflow,
        total_health_surcharge: total_surcharge,
        income_tax_payable: tax_out.payable_tax,
        net_taxable_income: tax_out.net_taxable_income,
        marginal_rate: tax_out.marginal_rate,
        year_end_net: cumulative,
    };

    let output = ProjectionOutput { monthly, annual };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "12-month household cash-flow projection (dividends, amortization, margin interest, annual tax withholding)",
        &serde_json::json!({
            "instruments": snapshot.instruments.len(),
            "mortgages": snapshot.mortgages.len(),
            "tax_withholding_month": snapshot.config.tax_withholding_month,
            "surcharge_threshold": snapshot.config.surcharge_threshold.to_string(),
            "surcharge_rate": snapshot.config.surcharge_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
