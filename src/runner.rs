//! Monte Carlo Runner
//!
//! Blends the scenario set once, then draws `num_trials` independent trials,
//! projects each one and aggregates the outputs.
//!
//! ## Execution
//! - Sequential on the calling thread (default), or across the rayon pool
//!   with `parallel = true`. Trial order is preserved either way.
//! - Cancellation is cooperative: the token is checked before every trial.
//!   A cancelled run yields `EngineError::Cancelled`, never a partial result.
//! - `spawn_monte_carlo` moves a run onto a worker thread for callers that
//!   must not block.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{MonteCarloResult, ResultAggregator, DEFAULT_BINS, RETAINED_TRIALS};
use crate::blender;
use crate::error::{EngineError, Result};
use crate::projection::{self, project_trial, ProjectedKpis, StochasticModel};
use crate::sampler::RandomSampler;
use crate::scenario::{BaselineSnapshot, ScenarioDefinition};
use crate::trial::{Trial, TrialGenerator};

pub const DEFAULT_TRIALS: usize = 10_000;
const MAX_PREALLOCATED_TRIALS: usize = 100_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub num_trials: usize,
    pub bins: usize,
    pub retained_trials: usize,
    pub stochastic_model: StochasticModel,
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_trials: DEFAULT_TRIALS,
            bins: DEFAULT_BINS,
            retained_trials: RETAINED_TRIALS,
            stochastic_model: StochasticModel::Legacy,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(num_trials: usize) -> Self {
        Self {
            num_trials,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_trials == 0 {
            return Err(EngineError::InvalidInput(
                "number of trials must be positive".to_string(),
            ));
        }
        if self.bins == 0 {
            return Err(EngineError::InvalidInput(
                "histogram needs at least one bin".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared flag checked between trials.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SimulationRunner {
    config: SimulationConfig,
    cancel: CancellationToken,
}

impl SimulationRunner {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs with the thread-local generator.
    pub fn run(
        &self,
        scenarios: &[ScenarioDefinition],
        baseline: &BaselineSnapshot,
    ) -> Result<MonteCarloResult> {
        if self.config.parallel {
            self.run_parallel(scenarios, baseline)
        } else {
            self.run_with_rng(scenarios, baseline, rand::thread_rng())
        }
    }

    /// Sequential run drawing from `rng`. Pass a seeded generator for repeatable output.
    pub fn run_with_rng<R: Rng>(
        &self,
        scenarios: &[ScenarioDefinition],
        baseline: &BaselineSnapshot,
        rng: R,
    ) -> Result<MonteCarloResult> {
        let generator = self.prepare(scenarios)?;
        let started = Instant::now();
        let requested = self.config.num_trials;

        let mut sampler = RandomSampler::with_rng(rng);
        let mut aggregator = ResultAggregator::with_capacity(
            self.config.bins,
            self.config.retained_trials,
            requested.min(MAX_PREALLOCATED_TRIALS),
        );

        for completed in 0..requested {
            if self.cancel.is_cancelled() {
                warn!(completed, requested, "monte carlo run cancelled");
                return Err(EngineError::Cancelled { completed, requested });
            }
            let params = generator.sample(&mut sampler);
            aggregator.push(project_trial(&params, baseline, self.config.stochastic_model));
        }

        self.finish(aggregator, started)
    }

    fn run_parallel(
        &self,
        scenarios: &[ScenarioDefinition],
        baseline: &BaselineSnapshot,
    ) -> Result<MonteCarloResult> {
        let generator = self.prepare(scenarios)?;
        let started = Instant::now();
        let requested = self.config.num_trials;
        let model = self.config.stochastic_model;
        let completed = AtomicUsize::new(0);

        let trials: Option<Vec<Trial>> = (0..requested)
            .into_par_iter()
            .map_init(RandomSampler::new, |sampler, _| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let params = generator.sample(sampler);
                completed.fetch_add(1, Ordering::Relaxed);
                Some(project_trial(&params, baseline, model))
            })
            .collect();

        let Some(trials) = trials else {
            let completed = completed.load(Ordering::Relaxed);
            warn!(completed, requested, "monte carlo run cancelled");
            return Err(EngineError::Cancelled { completed, requested });
        };

        let mut aggregator = ResultAggregator::new(self.config.bins, self.config.retained_trials);
        for trial in trials {
            aggregator.push(trial);
        }
        self.finish(aggregator, started)
    }

    fn prepare(&self, scenarios: &[ScenarioDefinition]) -> Result<TrialGenerator> {
        if scenarios.is_empty() {
            return Err(EngineError::InvalidInput("scenario list is empty".to_string()));
        }
        self.config.validate()?;

        let aggregate = blender::blend(scenarios)?;
        info!(
            scenarios = scenarios.len(),
            trials = self.config.num_trials,
            model = self.config.stochastic_model.name(),
            parallel = self.config.parallel,
            "starting monte carlo run"
        );
        debug!(?aggregate, "blended scenario parameters");

        Ok(TrialGenerator::new(aggregate))
    }

    fn finish(&self, aggregator: ResultAggregator, started: Instant) -> Result<MonteCarloResult> {
        let result = aggregator.finish()?;
        info!(
            trials = result.num_trials,
            p50 = result.percentiles.p50,
            var95 = result.statistics.var95,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "monte carlo run complete"
        );
        Ok(result)
    }
}

/// A run executing on a worker thread.
pub struct SimulationHandle {
    cancel: CancellationToken,
    handle: JoinHandle<Result<MonteCarloResult>>,
}

impl SimulationHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the run ends. A panic on the worker is resumed here.
    pub fn join(self) -> Result<MonteCarloResult> {
        self.handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    }
}

pub fn spawn_monte_carlo(
    scenarios: Vec<ScenarioDefinition>,
    baseline: BaselineSnapshot,
    config: SimulationConfig,
) -> SimulationHandle {
    let runner = SimulationRunner::new(config);
    let cancel = runner.cancellation_token();
    let handle = thread::spawn(move || runner.run(&scenarios, &baseline));
    SimulationHandle { cancel, handle }
}

/// Deterministic projection of one scenario.
pub fn project_scenario(
    scenario: &ScenarioDefinition,
    baseline: &BaselineSnapshot,
) -> Result<ProjectedKpis> {
    projection::project(scenario, baseline)
}

/// Monte Carlo run with default bins, retention and anchors.
pub fn run_monte_carlo(
    scenarios: &[ScenarioDefinition],
    baseline: &BaselineSnapshot,
    num_trials: usize,
) -> Result<MonteCarloResult> {
    SimulationRunner::new(SimulationConfig::with_trials(num_trials)).run(scenarios, baseline)
}
