//! Monte Carlo Risk Report
//!
//! Blends a scenario set and prints the simulated EBITDA distribution.
//!
//! ## Usage
//! ```bash
//! cargo run --bin monte_carlo --release
//! cargo run --bin monte_carlo --release -- --input scenarios.json --trials 50000 --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;

use scenario_risk::aggregate::HistogramBin;
use scenario_risk::blender;
use scenario_risk::logging::init_tracing;
use scenario_risk::{
    MonteCarloResult, ScenarioSet, SimulationConfig, SimulationRunner, StochasticModel,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    Legacy,
    Baseline,
}

impl From<ModelArg> for StochasticModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Legacy => StochasticModel::Legacy,
            ModelArg::Baseline => StochasticModel::Baseline,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "monte_carlo", about = "Monte Carlo risk distribution over a scenario set")]
struct Args {
    /// JSON file with `baseline` and `scenarios`; the built-in demo set if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// JSON file with simulation settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    trials: Option<usize>,
    #[arg(short, long)]
    bins: Option<usize>,
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,
    /// Spread trials over all cores
    #[arg(long)]
    parallel: bool,
    /// Print the full result as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn load(args: &Args) -> scenario_risk::Result<(ScenarioSet, SimulationConfig)> {
    let set = match &args.input {
        Some(path) => ScenarioSet::from_json(&std::fs::read_to_string(path)?)?,
        None => ScenarioSet::demo(),
    };

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(trials) = args.trials {
        config.num_trials = trials;
    }
    if let Some(bins) = args.bins {
        config.bins = bins;
    }
    if let Some(model) = args.model {
        config.stochastic_model = model.into();
    }
    config.parallel |= args.parallel;

    Ok((set, config))
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let (set, config) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let result = match SimulationRunner::new(config.clone()).run(&set.scenarios, &set.baseline) {
        Ok(result) => result,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    print_report(&set, &config, &result);
    ExitCode::SUCCESS
}

fn print_report(set: &ScenarioSet, config: &SimulationConfig, result: &MonteCarloResult) {
    println!("=======================================================");
    println!("  Monte Carlo Risk Simulation");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Scenarios:               {}", set.scenarios.len());
    println!("  Total weight:            {:.1}", blender::total_weight(&set.scenarios));
    println!("  Trials:                  {}", config.num_trials);
    println!("  Bins:                    {}", config.bins);
    println!("  Opex/cash anchors:       {}", config.stochastic_model.name());
    println!();

    if let Ok(aggregate) = blender::blend(&set.scenarios) {
        println!("Blended parameters (weighted +/- spread):");
        println!("{}", "-".repeat(50));
        println!(
            "  Revenue growth:          {:.2}% +/- {:.2}",
            aggregate.revenue_growth_pct, aggregate.spread.revenue_growth_pct
        );
        println!(
            "  Gross margin:            {:.2}% +/- {:.2}",
            aggregate.gross_margin_pct, aggregate.spread.gross_margin_pct
        );
        println!(
            "  Opex change:             {:.2}% +/- {:.2}",
            aggregate.opex_change_pct, aggregate.spread.opex_change_pct
        );
        println!(
            "  AR days:                 {:.1} +/- {:.1}",
            aggregate.ar_days, aggregate.spread.ar_days
        );
        println!();
    }

    println!("EBITDA distribution");
    println!("{}", "-".repeat(50));
    result.print();
    println!();

    println!("EBITDA histogram");
    println!("{}", "-".repeat(50));
    print_histogram(&result.ebitda_histogram);
}

fn print_histogram(bins: &[HistogramBin]) {
    let peak = bins.iter().map(|b| b.frequency).fold(0.0, f64::max);
    for bin in bins {
        let width = if peak > 0.0 {
            (bin.frequency / peak * 40.0).round() as usize
        } else {
            0
        };
        println!("  {:>16.0} | {:5.1}% {}", bin.value, bin.frequency, "#".repeat(width));
    }
}
