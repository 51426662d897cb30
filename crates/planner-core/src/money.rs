use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::PlannerError;
use crate::PlannerResult;

/// Round to 2 decimal places, half-up. Used when a derived value (weighted
/// cost basis, maintenance ratio) is surfaced at currency scale.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floor to whole currency units. Loan payments are surfaced this way.
pub fn floor_unit(value: Decimal) -> Decimal {
    value.floor()
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

/// Division that surfaces a typed error instead of panicking. Callers that can
/// legitimately see a zero denominator (total debt, total funds) must guard
/// before calling; this is the backstop for the cases that cannot.
pub fn checked_div(numer: Decimal, denom: Decimal, context: &str) -> PlannerResult<Decimal> {
    if denom.is_zero() {
        return Err(PlannerError::DivisionByZero {
            context: context.to_string(),
        });
    }
    Ok(numer / denom)
}

/// Fixed-2 formatting with thousands separators: 1234567.8 -> "1,234,567.80".
pub fn format_money(value: Decimal) -> String {
    let rounded = round2(value);
    let s = format!("{:.2}", rounded);
    let (number, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}.{frac}")
}
