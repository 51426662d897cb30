use planner_core::projection::project;
use planner_core::snapshot::{
    AssetCategory, DistributionMode, EngineConfig, Instrument, Mortgage, PlanSnapshot,
    RepaymentMethod, SecuredLoan, TaxStatus,
};
use planner_core::stress::{stress_test, NO_DEBT_RATIO};
use planner_core::tax;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// End-to-end projection and stress-test scenarios
// ===========================================================================

fn household() -> TaxStatus {
    TaxStatus {
        salary: dec!(960_000),
        dependents: 1,
        has_spouse: true,
        has_disability: false,
        monthly_expense: dec!(45_000),
    }
}

fn empty_snapshot() -> PlanSnapshot {
    PlanSnapshot {
        instruments: vec![],
        mortgages: vec![],
        collateral_loan: None,
        margin_loan: None,
        consumer_loan: None,
        tax_status: household(),
        allocation: None,
        config: EngineConfig::default(),
    }
}

fn etf(
    id: &str,
    quantity: Decimal,
    rate: Decimal,
    mode: DistributionMode,
    months: Vec<u32>,
) -> Instrument {
    Instrument {
        id: id.into(),
        name: id.into(),
        category: AssetCategory::IncomeProducing,
        quantity,
        cost_basis: dec!(20),
        current_price: dec!(38.5),
        dividend_rate: rate,
        distribution_mode: mode,
        distribution_months: months,
        margin_balance: None,
        margin_rate_pct: None,
        lots: None,
    }
}

// ---------------------------------------------------------------------------
// Dividend aggregation round-trips
// ---------------------------------------------------------------------------

#[test]
fn test_annual_total_concrete_scenario() {
    // 1000 units, annual-total rate 2.8, quarterly in 1/4/7/10:
    // 700 per distribution month, 2800 for the year.
    let mut snapshot = empty_snapshot();
    snapshot.instruments.push(etf(
        "0056",
        dec!(1000),
        dec!(2.8),
        DistributionMode::AnnualTotal,
        vec![1, 4, 7, 10],
    ));
    let out = project(&snapshot).unwrap().result;

    for row in &out.monthly {
        let expected = if [1, 4, 7, 10].contains(&row.month) {
            dec!(700)
        } else {
            Decimal::ZERO
        };
        assert_eq!(row.dividend_income, expected, "month {}", row.month);
    }
    assert_eq!(out.annual.total_dividend, dec!(2800));
}

#[test]
fn test_per_distribution_round_trip() {
    // Per-distribution rate R with months {3,6,9,12}: each payout is Q*R and
    // the annual total is 4*Q*R, never divided by frequency.
    let quantity = dec!(500);
    let rate = dec!(1.1);
    let mut snapshot = empty_snapshot();
    snapshot.instruments.push(etf(
        "00878",
        quantity,
        rate,
        DistributionMode::PerDistribution,
        vec![3, 6, 9, 12],
    ));

    assert_eq!(
        tax::total_annual_dividend(&snapshot.instruments),
        dec!(4) * quantity * rate
    );

    let out = project(&snapshot).unwrap().result;
    for row in &out.monthly {
        let expected = if [3, 6, 9, 12].contains(&row.month) {
            quantity * rate
        } else {
            Decimal::ZERO
        };
        assert_eq!(row.dividend_income, expected, "month {}", row.month);
    }
}

// ---------------------------------------------------------------------------
// Tax withholding happens exactly once
// ---------------------------------------------------------------------------

#[test]
fn test_annual_tax_applied_at_single_point() {
    let mut snapshot = empty_snapshot();
    snapshot.instruments.push(etf(
        "0056",
        dec!(20_000),
        dec!(2.8),
        DistributionMode::AnnualTotal,
        vec![1, 4, 7, 10],
    ));
    let out = project(&snapshot).unwrap().result;

    let gross = tax::total_annual_dividend(&snapshot.instruments);
    let expected = tax::income_tax(&snapshot.tax_status, gross).unwrap().payable_tax;
    assert!(expected > Decimal::ZERO);

    let total_withheld: Decimal = out.monthly.iter().map(|r| r.income_tax_withheld).sum();
    assert_eq!(total_withheld, expected);
    assert_eq!(out.monthly[4].income_tax_withheld, expected);
    assert_eq!(out.annual.income_tax_payable, expected);

    // Year-end net is the month-12 cumulative; the tax is inside the monthly
    // pass and must not be subtracted a second time.
    assert_eq!(out.annual.year_end_net, out.monthly[11].cumulative);
}

#[test]
fn test_withholding_month_is_configurable() {
    let mut snapshot = empty_snapshot();
    snapshot.tax_status.salary = dec!(2_000_000);
    snapshot.config.tax_withholding_month = 9;
    let out = project(&snapshot).unwrap().result;
    assert!(out.monthly[8].income_tax_withheld > Decimal::ZERO);
    assert_eq!(out.monthly[4].income_tax_withheld, Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Combined loan outflows
// ---------------------------------------------------------------------------

#[test]
fn test_full_household_outflows() {
    let mut snapshot = empty_snapshot();
    snapshot.mortgages.push(Mortgage {
        principal: dec!(8_340_000),
        total_months: 480,
        elapsed_months: 0,
        rate1_pct: dec!(1.775),
        rate2_pct: dec!(1.775),
        rate1_months: 480,
        grace_months: 60,
        method: RepaymentMethod::LevelPayment,
        start_date: None,
    });
    snapshot.collateral_loan = Some(SecuredLoan {
        principal: dec!(1_200_000),
        rate_pct: dec!(2.5),
        maintenance_threshold_pct: dec!(130),
    });
    let mut margined = etf(
        "2884",
        dec!(1000),
        dec!(1.2),
        DistributionMode::AnnualTotal,
        vec![8],
    );
    margined.margin_balance = Some(dec!(600_000));
    margined.margin_rate_pct = Some(dec!(7.2));
    snapshot.instruments.push(margined);

    let out = project(&snapshot).unwrap().result;
    let january = &out.monthly[0];

    // Grace-period mortgage: 12_336. Collateral: 1.2M*2.5/1200 = 2_500.
    // Instrument margin: 600k*7.2/1200 = 3_600.
    assert_eq!(january.mortgage_payment, dec!(12_336));
    assert_eq!(january.margin_interest, dec!(2_500) + dec!(3_600));
    assert_eq!(january.consumer_payment, Decimal::ZERO);
    assert_eq!(
        january.net_flow,
        january.dividend_income
            - january.mortgage_payment
            - january.margin_interest
            - january.health_surcharge
            - january.income_tax_withheld
            - january.living_expense
    );

    assert_eq!(
        out.annual.total_loan_outflow,
        dec!(12) * (dec!(12_336) + dec!(2_500) + dec!(3_600))
    );
}

// ---------------------------------------------------------------------------
// Stress test scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_stress_zero_drawdown_matches_current_state() {
    let mut snapshot = empty_snapshot();
    snapshot.instruments.push(etf(
        "0056",
        dec!(10_000),
        dec!(2.8),
        DistributionMode::AnnualTotal,
        vec![1, 4, 7, 10],
    ));
    snapshot.margin_loan = Some(SecuredLoan {
        principal: dec!(200_000),
        rate_pct: dec!(6),
        maintenance_threshold_pct: dec!(130),
    });
    let out = stress_test(&snapshot).unwrap().result;

    // 10_000 * 38.5 = 385_000 undiscounted.
    assert_eq!(out.rows[0].residual_value, dec!(385_000));
    assert_eq!(out.rows[0].maintenance_ratio, dec!(192.50));
    assert_eq!(out.rows[0].required_top_up, Decimal::ZERO);
}

#[test]
fn test_stress_zero_debt_never_divides() {
    let mut snapshot = empty_snapshot();
    snapshot.instruments.push(etf(
        "0050",
        dec!(100),
        dec!(3),
        DistributionMode::AnnualTotal,
        vec![1, 7],
    ));
    let out = stress_test(&snapshot).unwrap().result;
    for row in &out.rows {
        assert_eq!(row.maintenance_ratio, NO_DEBT_RATIO);
        assert!(!row.margin_call);
        assert_eq!(row.required_top_up, Decimal::ZERO);
    }
}

#[test]
fn test_stress_empty_portfolio_with_debt() {
    let mut snapshot = empty_snapshot();
    snapshot.margin_loan = Some(SecuredLoan {
        principal: dec!(100_000),
        rate_pct: dec!(6),
        maintenance_threshold_pct: dec!(130),
    });
    let out = stress_test(&snapshot).unwrap().result;
    // Value is zero at every level: the call is immediate and the top-up is
    // the entire debt.
    for row in &out.rows {
        assert_eq!(row.maintenance_ratio, Decimal::ZERO);
        assert!(row.margin_call);
        assert_eq!(row.required_top_up, dec!(100_000));
    }
}
