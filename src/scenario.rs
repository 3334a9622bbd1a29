//! Scenario and Baseline Inputs
//!
//! Value types handed in by the caller. The engine never mutates them.
//!
//! ## Units
//! - `*_pct` fields are percentages (`35.0` = 35%)
//! - `*_days` fields are calendar days
//! - Currency fields are raw magnitudes in the caller's currency

use serde::{Deserialize, Serialize};

/// One named, probability-weighted hypothesis about the next period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    pub probability_weight: f64, // 0-100, not required to sum to 100
    pub revenue_growth_pct: f64,
    #[serde(default)]
    pub cost_change_pct: f64,
    pub gross_margin_pct: f64,
    pub opex_change_pct: f64,
    pub ar_days: f64,
    pub ap_days: f64,
    pub inventory_days: f64,
    #[serde(default)]
    pub is_primary: bool,
}

impl ScenarioDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, probability_weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            probability_weight,
            revenue_growth_pct: 0.0,
            cost_change_pct: 0.0,
            gross_margin_pct: 0.0,
            opex_change_pct: 0.0,
            ar_days: 0.0,
            ap_days: 0.0,
            inventory_days: 0.0,
            is_primary: false,
        }
    }

    /// Cash conversion cycle implied by this scenario's working-capital days.
    pub fn cash_conversion_cycle(&self) -> f64 {
        self.ar_days + self.inventory_days - self.ap_days
    }

    /// Base / upside / downside set used by the CLI when no input file is given.
    pub fn demo_set() -> Vec<Self> {
        vec![
            Self {
                revenue_growth_pct: 8.0,
                cost_change_pct: 3.0,
                gross_margin_pct: 34.0,
                opex_change_pct: 2.0,
                ar_days: 50.0,
                ap_days: 35.0,
                inventory_days: 28.0,
                is_primary: true,
                ..Self::new("base", "Base case", 60.0)
            },
            Self {
                revenue_growth_pct: 18.0,
                cost_change_pct: 5.0,
                gross_margin_pct: 38.0,
                opex_change_pct: 6.0,
                ar_days: 45.0,
                ap_days: 38.0,
                inventory_days: 24.0,
                ..Self::new("upside", "Upside", 20.0)
            },
            Self {
                revenue_growth_pct: -12.0,
                cost_change_pct: 8.0,
                gross_margin_pct: 27.0,
                opex_change_pct: -4.0,
                ar_days: 65.0,
                ap_days: 30.0,
                inventory_days: 40.0,
                ..Self::new("downside", "Downside", 20.0)
            },
        ]
    }
}

/// Current-period actuals used as the projection anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineSnapshot {
    pub monthly_revenue: f64,
    pub cash_on_hand: f64,
    pub ebitda: f64,
    pub dso_days: f64,
    #[serde(default)]
    pub ccc_days: f64,
    #[serde(default)]
    pub gross_margin_pct: f64,
}

impl Default for BaselineSnapshot {
    fn default() -> Self {
        Self {
            monthly_revenue: 1_000_000_000.0,
            cash_on_hand: 500_000_000.0,
            ebitda: 200_000_000.0,
            dso_days: 45.0,
            ccc_days: 40.0,
            gross_margin_pct: 35.0,
        }
    }
}

/// Input document accepted by the binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSet {
    pub baseline: BaselineSnapshot,
    pub scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioSet {
    pub fn demo() -> Self {
        Self {
            baseline: BaselineSnapshot::default(),
            scenarios: ScenarioDefinition::demo_set(),
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_field_names() {
        let scenario = ScenarioDefinition::demo_set().remove(0);
        let json = serde_json::to_value(&scenario).unwrap();

        assert!(json.get("probabilityWeight").is_some());
        assert!(json.get("revenueGrowthPct").is_some());
        assert!(json.get("inventoryDays").is_some());
        assert_eq!(json["isPrimary"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_parse_scenario_set() {
        let json = r#"{
            "baseline": {
                "monthlyRevenue": 1000000000,
                "cashOnHand": 500000000,
                "ebitda": 200000000,
                "dsoDays": 45
            },
            "scenarios": [{
                "id": "a",
                "name": "Only",
                "probabilityWeight": 100,
                "revenueGrowthPct": 10,
                "grossMarginPct": 35,
                "opexChangePct": 0,
                "arDays": 45,
                "apDays": 30,
                "inventoryDays": 20
            }]
        }"#;

        let set = ScenarioSet::from_json(json).unwrap();
        assert_eq!(set.scenarios.len(), 1);
        assert_eq!(set.baseline.ccc_days, 0.0);
        assert!(!set.scenarios[0].is_primary);
        assert!((set.scenarios[0].cash_conversion_cycle() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_demo_weights_sum_to_100() {
        let total: f64 = ScenarioDefinition::demo_set()
            .iter()
            .map(|s| s.probability_weight)
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
