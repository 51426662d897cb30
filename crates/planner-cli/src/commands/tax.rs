use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use planner_core::snapshot::TaxStatus;
use planner_core::tax;

use crate::input;

/// Arguments for the annual income-tax computation
#[derive(Args)]
pub struct TaxArgs {
    /// Annual salary income
    #[arg(long)]
    pub salary: Option<Decimal>,

    /// Gross annual dividend income
    #[arg(long, default_value = "0")]
    pub dividend: Decimal,

    /// Number of dependents
    #[arg(long, default_value_t = 0)]
    pub dependents: u32,

    /// Married filing jointly
    #[arg(long)]
    pub spouse: bool,

    /// Disability special deduction applies
    #[arg(long)]
    pub disability: bool,

    /// Path to a JSON snapshot file; its tax status and instruments
    /// override the individual flags
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (status, dividend) = if args.input.is_some() {
        let snapshot = input::load_snapshot(args.input.as_deref())?;
        let dividend = tax::total_annual_dividend(&snapshot.instruments);
        (snapshot.tax_status, dividend)
    } else {
        let status = TaxStatus {
            salary: args.salary.ok_or("--salary is required (or provide --input)")?,
            dependents: args.dependents,
            has_spouse: args.spouse,
            has_disability: args.disability,
            monthly_expense: Decimal::ZERO,
        };
        (status, args.dividend)
    };

    let result = tax::income_tax(&status, dividend)?;
    Ok(serde_json::to_value(result)?)
}
