mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analytics::AnalyticsArgs;
use commands::payment::PaymentArgs;
use commands::project::ProjectArgs;
use commands::stress::StressArgs;
use commands::tax::TaxArgs;

/// Household dividend, loan, and leverage planning
#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Household cash-flow, tax, and leverage planning",
    long_about = "Projects a 12-month household cash-flow schedule from a portfolio \
                  snapshot, with exact decimal arithmetic. Covers dividend inflows, \
                  mortgage and consumer-loan amortization, margin interest, progressive \
                  income tax, the NHI dividend surcharge, and margin-call stress tests."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project 12 months of cash flow from a snapshot
    Project(ProjectArgs),
    /// Run the margin-call stress test across price drawdowns
    Stress(StressArgs),
    /// Compute annual progressive income tax
    Tax(TaxArgs),
    /// Look up amortizing-loan payments month by month
    Payment(PaymentArgs),
    /// Derived analytics: FIRE ratio, radar score, wealth snowball
    Analytics(AnalyticsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Stress(args) => commands::stress::run_stress(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::Payment(args) => commands::payment::run_payment(args),
        Commands::Analytics(args) => commands::analytics::run_analytics(args),
        Commands::Version => {
            println!("planner {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
