use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::money::{compound, floor_unit};
use crate::snapshot::{ConsumerLoan, Mortgage, RepaymentMethod};
use crate::types::{Money, RatePct};
use crate::PlannerResult;

/// Percent-per-year to decimal-per-month: pct / 100 / 12.
fn monthly_rate(annual_pct: RatePct) -> Decimal {
    annual_pct / dec!(1200)
}

/// Level annuity payment: P * r * (1+r)^n / ((1+r)^n - 1).
/// Zero-rate loans degrade to straight division.
fn annuity_payment(principal: Money, rate: Decimal, periods: u32) -> Money {
    if periods == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return principal / Decimal::from(periods);
    }
    let factor = compound(rate, periods);
    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return principal / Decimal::from(periods);
    }
    principal * rate * factor / denom
}

/// Payment due on a mortgage in the `offset`-th projected month (offset >= 1).
///
/// The loan's absolute month index is elapsed + offset; the projection does
/// not re-anchor to a calendar. Payments are floored to whole currency units.
pub fn monthly_payment(loan: &Mortgage, offset: u32) -> PlannerResult<Money> {
    let month = loan.elapsed_months + offset;
    if month > loan.total_months || loan.principal <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let annual = if month <= loan.rate1_months {
        loan.rate1_pct
    } else {
        loan.rate2_pct
    };
    let rate = monthly_rate(annual);

    if month <= loan.grace_months {
        return Ok(floor_unit(loan.principal * rate));
    }

    // Grace period at or beyond the term leaves nothing to amortize.
    // Inconsistent configuration degrades to a zero payment, not an error.
    if loan.grace_months >= loan.total_months {
        return Ok(Decimal::ZERO);
    }
    let remaining_term = loan.total_months - loan.grace_months;

    let payment = match loan.method {
        RepaymentMethod::LevelPayment => annuity_payment(loan.principal, rate, remaining_term),
        RepaymentMethod::EqualPrincipal => {
            let fixed_principal = floor_unit(loan.principal / Decimal::from(remaining_term));
            let months_into_repayment = month - loan.grace_months;
            let repaid = (fixed_principal * Decimal::from(months_into_repayment - 1))
                .min(loan.principal);
            let outstanding = (loan.principal - repaid).max(Decimal::ZERO);
            fixed_principal + outstanding * rate
        }
    };

    Ok(floor_unit(payment))
}

/// Level payment on a flat-rate consumer loan in the `offset`-th projected
/// month. Zero once the loan is retired or was never drawn.
pub fn consumer_loan_payment(loan: &ConsumerLoan, offset: u32) -> PlannerResult<Money> {
    if loan.principal <= Decimal::ZERO
        || loan.total_months == 0
        || loan.elapsed_months + offset > loan.total_months
    {
        return Ok(Decimal::ZERO);
    }
    let rate = monthly_rate(loan.rate_pct);
    Ok(floor_unit(annuity_payment(
        loan.principal,
        rate,
        loan.total_months,
    )))
}

/// One month of interest on a non-amortizing balance (margin or collateral
/// borrowing): principal * pct / 1200.
pub fn interest_only(principal: Money, annual_rate_pct: RatePct) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    floor_unit(principal * monthly_rate(annual_rate_pct))
}
