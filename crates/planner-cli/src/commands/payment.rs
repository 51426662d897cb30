use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use planner_core::amortize;
use planner_core::snapshot::{Mortgage, RepaymentMethod};

/// Arguments for month-by-month loan payment lookup
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual rate in percent for the first tier (e.g. 1.775)
    #[arg(long)]
    pub rate1: Decimal,

    /// Annual rate in percent after the first tier (defaults to rate1)
    #[arg(long)]
    pub rate2: Option<Decimal>,

    /// Months the first-tier rate applies (defaults to the whole term)
    #[arg(long)]
    pub rate1_months: Option<u32>,

    /// Total term in months
    #[arg(long)]
    pub total_months: u32,

    /// Interest-only grace period in months
    #[arg(long, default_value_t = 0)]
    pub grace: u32,

    /// Months already elapsed before this projection
    #[arg(long, default_value_t = 0)]
    pub elapsed: u32,

    /// Repayment convention
    #[arg(long, value_enum, default_value = "level-payment")]
    pub method: MethodArg,

    /// How many projected months to list
    #[arg(long, default_value_t = 12)]
    pub months: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    LevelPayment,
    EqualPrincipal,
}

impl From<MethodArg> for RepaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::LevelPayment => RepaymentMethod::LevelPayment,
            MethodArg::EqualPrincipal => RepaymentMethod::EqualPrincipal,
        }
    }
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = Mortgage {
        principal: args.principal,
        total_months: args.total_months,
        elapsed_months: args.elapsed,
        rate1_pct: args.rate1,
        rate2_pct: args.rate2.unwrap_or(args.rate1),
        rate1_months: args.rate1_months.unwrap_or(args.total_months),
        grace_months: args.grace,
        method: args.method.into(),
        start_date: None,
    };

    let mut rows = Vec::with_capacity(args.months as usize);
    for offset in 1..=args.months {
        let payment = amortize::monthly_payment(&loan, offset)?;
        rows.push(serde_json::json!({
            "month": offset,
            "loan_month": loan.elapsed_months + offset,
            "payment": payment.to_string(),
        }));
    }

    Ok(serde_json::json!({ "rows": rows }))
}
