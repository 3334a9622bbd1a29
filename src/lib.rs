//! Scenario Risk Engine
//!
//! Scenario projection and Monte Carlo risk analysis for financial planning.
//! A set of probability-weighted scenarios is projected one by one, or
//! blended and sampled thousands of times to get an EBITDA/revenue/cash
//! distribution with VaR/CVaR.
//!
//! ## Modules
//!
//! - `sampler`: Box-Muller normal draws over an injected generator
//! - `blender`: probability-weighted blend and ScenarioSpread
//! - `trial`: per-trial parameter perturbation
//! - `projection`: deterministic and per-trial KPI projection
//! - `aggregate`: histograms, percentiles, tail risk
//! - `runner`: orchestration, cancellation, background runs
//! - `store`: persistence interfaces with in-memory versions
//!
//! ## Usage
//!
//! ```bash
//! # Side-by-side projection of each scenario
//! cargo run --bin project --release
//!
//! # Monte Carlo risk distribution
//! cargo run --bin monte_carlo --release -- --trials 20000
//! ```

pub mod aggregate;
pub mod blender;
pub mod error;
pub mod logging;
pub mod projection;
pub mod runner;
pub mod sampler;
pub mod scenario;
pub mod store;
pub mod trial;

pub use aggregate::MonteCarloResult;
pub use error::{EngineError, Result};
pub use projection::{ProjectedKpis, StochasticModel};
pub use runner::{project_scenario, run_monte_carlo, spawn_monte_carlo, SimulationConfig, SimulationRunner};
pub use scenario::{BaselineSnapshot, ScenarioDefinition, ScenarioSet};
