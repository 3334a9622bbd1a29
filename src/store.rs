//! Scenario and Simulation Stores
//!
//! The engine does not persist anything itself. These traits describe what
//! it expects from the surrounding application; the in-memory versions back
//! the binaries and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::MonteCarloResult;
use crate::error::{EngineError, Result};
use crate::scenario::ScenarioDefinition;

pub trait ScenarioStore {
    fn create(&mut self, scenario: ScenarioDefinition) -> Result<()>;
    fn update(&mut self, scenario: ScenarioDefinition) -> Result<()>;
    fn delete(&mut self, id: &str) -> Result<ScenarioDefinition>;
    fn list(&self) -> Vec<ScenarioDefinition>;
    /// Marks `id` primary and clears the flag everywhere else.
    fn set_primary(&mut self, id: &str) -> Result<()>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub num_trials: usize,
    pub result: MonteCarloResult,
}

pub trait SimulationHistoryStore {
    fn save(&mut self, result: MonteCarloResult) -> Result<u64>;
    /// Newest first.
    fn list(&self) -> Vec<&SimulationRecord>;
    fn delete(&mut self, id: u64) -> Result<SimulationRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    scenarios: Vec<ScenarioDefinition>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("scenario {id}")))
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn create(&mut self, scenario: ScenarioDefinition) -> Result<()> {
        if self.scenarios.iter().any(|s| s.id == scenario.id) {
            return Err(EngineError::InvalidInput(format!(
                "scenario {} already exists",
                scenario.id
            )));
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    fn update(&mut self, scenario: ScenarioDefinition) -> Result<()> {
        let idx = self.position(&scenario.id)?;
        self.scenarios[idx] = scenario;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<ScenarioDefinition> {
        let idx = self.position(id)?;
        Ok(self.scenarios.remove(idx))
    }

    fn list(&self) -> Vec<ScenarioDefinition> {
        self.scenarios.clone()
    }

    fn set_primary(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        for (i, scenario) in self.scenarios.iter_mut().enumerate() {
            scenario.is_primary = i == idx;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySimulationHistory {
    records: Vec<SimulationRecord>,
    next_id: u64,
}

impl InMemorySimulationHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimulationHistoryStore for InMemorySimulationHistory {
    fn save(&mut self, result: MonteCarloResult) -> Result<u64> {
        self.next_id += 1;
        self.records.push(SimulationRecord {
            id: self.next_id,
            created_at: Utc::now(),
            num_trials: result.num_trials,
            result,
        });
        Ok(self.next_id)
    }

    fn list(&self) -> Vec<&SimulationRecord> {
        let mut records: Vec<&SimulationRecord> = self.records.iter().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records
    }

    fn delete(&mut self, id: u64) -> Result<SimulationRecord> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("simulation run {id}")))?;
        Ok(self.records.remove(idx))
    }
}
