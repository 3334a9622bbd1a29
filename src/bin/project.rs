//! Scenario Projection Table
//!
//! Projects each scenario deterministically and prints them side by side,
//! followed by the probability-weighted blend.
//!
//! ## Usage
//! ```bash
//! cargo run --bin project --release -- --input scenarios.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use scenario_risk::logging::init_tracing;
use scenario_risk::projection::{compare_scenarios, weighted_projection};
use scenario_risk::{ProjectedKpis, ScenarioSet};

#[derive(Parser, Debug)]
#[command(name = "project", about = "Deterministic projection of each scenario")]
struct Args {
    /// JSON file with `baseline` and `scenarios`; the built-in demo set if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn run(args: &Args) -> scenario_risk::Result<()> {
    let set = match &args.input {
        Some(path) => ScenarioSet::from_json(&std::fs::read_to_string(path)?)?,
        None => ScenarioSet::demo(),
    };

    let rows = compare_scenarios(&set.scenarios, &set.baseline)?;
    let weighted = weighted_projection(&set.scenarios, &set.baseline)?;

    println!("=======================================================");
    println!("  Scenario Projections");
    println!("=======================================================");
    println!();
    println!("Baseline:");
    println!("  Monthly revenue:         {:.0}", set.baseline.monthly_revenue);
    println!("  EBITDA:                  {:.0}", set.baseline.ebitda);
    println!("  Cash on hand:            {:.0}", set.baseline.cash_on_hand);
    println!("  DSO:                     {:.1} days", set.baseline.dso_days);
    println!();

    println!("| Scenario         | Revenue          | EBITDA           | Cash             |   CCC |");
    println!("|------------------|------------------|------------------|------------------|-------|");
    for (name, kpis) in &rows {
        print_row(name, kpis);
    }
    print_row("Weighted", &weighted);
    println!();

    for (scenario, (name, kpis)) in set.scenarios.iter().zip(&rows) {
        let marker = if scenario.is_primary { " (primary)" } else { "" };
        println!("{name}{marker}, weight {:.1}%", scenario.probability_weight);
        println!("{}", "-".repeat(50));
        kpis.print();
        println!();
    }

    Ok(())
}

fn print_row(name: &str, kpis: &ProjectedKpis) {
    println!(
        "| {:16} | {:16.0} | {:16.0} | {:16.0} | {:5.1} |",
        name, kpis.revenue, kpis.ebitda, kpis.cash, kpis.ccc
    );
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
