//! Scenario Blending
//!
//! Collapses a scenario set into one probability-weighted parameter vector.
//!
//! ## Weighting
//! `weighted(P) = sum(P * weight / 100)` with weights taken as given. A set
//! whose weights do not add up to 100 is blended anyway (and logged).
//!
//! ## ScenarioSpread
//! The per-parameter spread is the largest distance of any single scenario
//! from the weighted value. It is a heuristic for a handful of hand-written
//! scenarios and is NOT a standard deviation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::scenario::ScenarioDefinition;

const WEIGHT_TOTAL: f64 = 100.0;
const WEIGHT_TOLERANCE: f64 = 0.01;

/// Max absolute deviation of any scenario from the weighted value, per parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSpread {
    pub revenue_growth_pct: f64,
    pub gross_margin_pct: f64,
    pub opex_change_pct: f64,
    pub ar_days: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateParameters {
    pub revenue_growth_pct: f64,
    pub gross_margin_pct: f64,
    pub opex_change_pct: f64,
    pub ar_days: f64,
    // Not perturbed per trial; carried for the weighted projection
    pub ap_days: f64,
    pub inventory_days: f64,
    pub spread: ScenarioSpread,
}

impl AggregateParameters {
    /// The blended inputs as a synthetic scenario, for deterministic projection.
    pub fn as_scenario(&self) -> ScenarioDefinition {
        ScenarioDefinition {
            revenue_growth_pct: self.revenue_growth_pct,
            gross_margin_pct: self.gross_margin_pct,
            opex_change_pct: self.opex_change_pct,
            ar_days: self.ar_days,
            ap_days: self.ap_days,
            inventory_days: self.inventory_days,
            ..ScenarioDefinition::new("weighted", "Probability-weighted", WEIGHT_TOTAL)
        }
    }
}

pub fn total_weight(scenarios: &[ScenarioDefinition]) -> f64 {
    scenarios.iter().map(|s| s.probability_weight).sum()
}

fn weighted(scenarios: &[ScenarioDefinition], field: impl Fn(&ScenarioDefinition) -> f64) -> f64 {
    scenarios
        .iter()
        .map(|s| field(s) * s.probability_weight / WEIGHT_TOTAL)
        .sum()
}

fn spread(
    scenarios: &[ScenarioDefinition],
    center: f64,
    field: impl Fn(&ScenarioDefinition) -> f64,
) -> f64 {
    scenarios
        .iter()
        .map(|s| (field(s) - center).abs())
        .fold(0.0, f64::max)
}

pub fn blend(scenarios: &[ScenarioDefinition]) -> Result<AggregateParameters> {
    if scenarios.is_empty() {
        return Err(EngineError::InvalidInput(
            "cannot blend an empty scenario set".to_string(),
        ));
    }

    let total = total_weight(scenarios);
    if (total - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
        warn!(total_weight = total, "scenario weights do not sum to 100, blending as given");
    }

    let revenue_growth_pct = weighted(scenarios, |s| s.revenue_growth_pct);
    let gross_margin_pct = weighted(scenarios, |s| s.gross_margin_pct);
    let opex_change_pct = weighted(scenarios, |s| s.opex_change_pct);
    let ar_days = weighted(scenarios, |s| s.ar_days);

    Ok(AggregateParameters {
        revenue_growth_pct,
        gross_margin_pct,
        opex_change_pct,
        ar_days,
        ap_days: weighted(scenarios, |s| s.ap_days),
        inventory_days: weighted(scenarios, |s| s.inventory_days),
        spread: ScenarioSpread {
            revenue_growth_pct: spread(scenarios, revenue_growth_pct, |s| s.revenue_growth_pct),
            gross_margin_pct: spread(scenarios, gross_margin_pct, |s| s.gross_margin_pct),
            opex_change_pct: spread(scenarios, opex_change_pct, |s| s.opex_change_pct),
            ar_days: spread(scenarios, ar_days, |s| s.ar_days),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn scenario(weight: f64, growth: f64, margin: f64, opex: f64, ar: f64) -> ScenarioDefinition {
        ScenarioDefinition {
            revenue_growth_pct: growth,
            gross_margin_pct: margin,
            opex_change_pct: opex,
            ar_days: ar,
            ..ScenarioDefinition::new("s", "s", weight)
        }
    }

    fn within(set: &[ScenarioDefinition], value: f64, field: fn(&ScenarioDefinition) -> f64) -> bool {
        let lo = set.iter().map(field).fold(f64::INFINITY, f64::min);
        let hi = set.iter().map(field).fold(f64::NEG_INFINITY, f64::max);
        value >= lo - 1e-9 && value <= hi + 1e-9
    }

    #[test]
    fn test_empty_set_is_invalid() {
        assert!(matches!(blend(&[]), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_weighted_values_and_spread() {
        let set = vec![
            scenario(50.0, 10.0, 30.0, 0.0, 40.0),
            scenario(30.0, 20.0, 40.0, 10.0, 50.0),
            scenario(20.0, -10.0, 20.0, -5.0, 70.0),
        ];
        let agg = blend(&set).unwrap();

        // 5 + 6 - 2
        assert!((agg.revenue_growth_pct - 9.0).abs() < 1e-9);
        // 15 + 12 + 4
        assert!((agg.gross_margin_pct - 31.0).abs() < 1e-9);
        assert!((agg.opex_change_pct - 2.0).abs() < 1e-9);
        assert!((agg.ar_days - 49.0).abs() < 1e-9);

        assert!((agg.spread.revenue_growth_pct - 19.0).abs() < 1e-9);
        assert!((agg.spread.gross_margin_pct - 11.0).abs() < 1e-9);
        assert!((agg.spread.opex_change_pct - 8.0).abs() < 1e-9);
        assert!((agg.spread.ar_days - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_scenario_has_zero_spread() {
        let agg = blend(&[scenario(100.0, 12.0, 33.0, 4.0, 48.0)]).unwrap();
        assert_eq!(agg.spread, ScenarioSpread::default());
        assert!((agg.revenue_growth_pct - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_not_renormalized() {
        let set = vec![
            scenario(25.0, 10.0, 30.0, 0.0, 40.0),
            scenario(25.0, 10.0, 30.0, 0.0, 40.0),
        ];
        let agg = blend(&set).unwrap();
        assert!((total_weight(&set) - 50.0).abs() < 1e-9);
        assert!((agg.revenue_growth_pct - 5.0).abs() < 1e-9);
        assert!((agg.ar_days - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_value_within_scenario_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let n = rng.gen_range(1..6);
            let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() + 0.01).collect();
            let sum: f64 = raw.iter().sum();
            let set: Vec<ScenarioDefinition> = raw
                .iter()
                .map(|w| {
                    scenario(
                        w / sum * 100.0,
                        rng.gen_range(-30.0..30.0),
                        rng.gen_range(10.0..60.0),
                        rng.gen_range(-20.0..20.0),
                        rng.gen_range(20.0..90.0),
                    )
                })
                .collect();

            let agg = blend(&set).unwrap();
            assert!(within(&set, agg.revenue_growth_pct, |s| s.revenue_growth_pct));
            assert!(within(&set, agg.gross_margin_pct, |s| s.gross_margin_pct));
            assert!(within(&set, agg.opex_change_pct, |s| s.opex_change_pct));
            assert!(within(&set, agg.ar_days, |s| s.ar_days));
        }
    }

    #[test]
    fn test_as_scenario_carries_working_capital_days() {
        let mut a = scenario(50.0, 10.0, 30.0, 0.0, 40.0);
        a.ap_days = 30.0;
        a.inventory_days = 20.0;
        let mut b = scenario(50.0, 10.0, 30.0, 0.0, 60.0);
        b.ap_days = 40.0;
        b.inventory_days = 30.0;

        let blended = blend(&[a, b]).unwrap().as_scenario();
        assert!((blended.ap_days - 35.0).abs() < 1e-9);
        assert!((blended.inventory_days - 25.0).abs() < 1e-9);
        assert!((blended.cash_conversion_cycle() - 40.0).abs() < 1e-9);
    }
}
