//! Financial Projection
//!
//! Maps a parameter vector and a baseline snapshot to next-period revenue,
//! EBITDA and cash.
//!
//! ## Formulas
//! ```text
//! revenue      = monthly_revenue * (1 + growth / 100)
//! gross_profit = revenue * margin / 100
//! ebitda       = gross_profit - opex
//! ccc          = ar_days + inventory_days - ap_days
//! cash         = cash_anchor - revenue / 30 * (ar_days - reference_dso)
//! ```
//!
//! ## Opex and cash anchors
//! The deterministic path anchors opex on baseline EBITDA and cash on the
//! caller's snapshot. Per-trial projection uses `StochasticModel`:
//! - `Legacy`: opex = 25% of monthly revenue, cash anchor 8.5e9, reference DSO 52
//! - `Baseline`: the same anchors as the deterministic path

use serde::{Deserialize, Serialize};

use crate::blender;
use crate::error::{EngineError, Result};
use crate::scenario::{BaselineSnapshot, ScenarioDefinition};
use crate::trial::{Trial, TrialParameters};

pub const DAYS_PER_MONTH: f64 = 30.0;

pub const LEGACY_OPEX_SHARE_OF_REVENUE: f64 = 0.25;
pub const LEGACY_CASH_REFERENCE: f64 = 8_500_000_000.0;
pub const LEGACY_REFERENCE_DSO_DAYS: f64 = 52.0;

/// Opex and cash anchoring for per-trial projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StochasticModel {
    /// Fixed 25%-of-revenue opex, 8.5e9 cash reference, 52-day DSO.
    #[default]
    Legacy,
    /// Opex from baseline EBITDA, cash and DSO from the baseline snapshot.
    Baseline,
}

impl StochasticModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "Legacy (fixed anchors)",
            Self::Baseline => "Baseline snapshot",
        }
    }

    fn opex(&self, baseline: &BaselineSnapshot, opex_change_pct: f64) -> f64 {
        let anchor = match self {
            Self::Legacy => baseline.monthly_revenue * LEGACY_OPEX_SHARE_OF_REVENUE,
            Self::Baseline => baseline.ebitda,
        };
        anchor * (1.0 + opex_change_pct / 100.0)
    }

    fn cash(&self, baseline: &BaselineSnapshot, revenue: f64, ar_days: f64) -> f64 {
        let (anchor, reference_dso) = match self {
            Self::Legacy => (LEGACY_CASH_REFERENCE, LEGACY_REFERENCE_DSO_DAYS),
            Self::Baseline => (baseline.cash_on_hand, baseline.dso_days),
        };
        anchor - ar_delta(revenue, ar_days, reference_dso)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedKpis {
    pub revenue: f64,
    pub gross_profit: f64,
    pub opex: f64,
    pub ebitda: f64,
    pub ccc: f64,
    pub cash: f64,
    pub revenue_change_pct: f64,
    pub ebitda_change_pct: f64,
    pub cash_change_pct: f64,
}

impl ProjectedKpis {
    pub fn print(&self) {
        println!("  Revenue:                 {:.0} ({:+.1}%)", self.revenue, self.revenue_change_pct);
        println!("  Gross profit:            {:.0}", self.gross_profit);
        println!("  Opex:                    {:.0}", self.opex);
        println!("  EBITDA:                  {:.0} ({:+.1}%)", self.ebitda, self.ebitda_change_pct);
        println!("  Cash:                    {:.0} ({:+.1}%)", self.cash, self.cash_change_pct);
        println!("  Cash conversion cycle:   {:.1} days", self.ccc);
    }
}

fn projected_revenue(monthly_revenue: f64, growth_pct: f64) -> f64 {
    monthly_revenue * (1.0 + growth_pct / 100.0)
}

/// Receivables tied up (or released) by collecting at `ar_days` instead of `reference_dso`.
fn ar_delta(revenue: f64, ar_days: f64, reference_dso: f64) -> f64 {
    let daily_sales = revenue / DAYS_PER_MONTH;
    daily_sales * (ar_days - reference_dso)
}

fn percent_change(projected: f64, baseline: f64, field: &'static str) -> Result<f64> {
    if baseline == 0.0 {
        return Err(EngineError::DivisionUndefined(field));
    }
    Ok((projected / baseline - 1.0) * 100.0)
}

/// Deterministic next-period KPIs for one scenario.
pub fn project(scenario: &ScenarioDefinition, baseline: &BaselineSnapshot) -> Result<ProjectedKpis> {
    let revenue = projected_revenue(baseline.monthly_revenue, scenario.revenue_growth_pct);
    let gross_profit = revenue * scenario.gross_margin_pct / 100.0;
    // Estimated from baseline EBITDA; the snapshot carries no opex figure
    let opex = baseline.ebitda * (1.0 + scenario.opex_change_pct / 100.0);
    let ebitda = gross_profit - opex;
    let cash = baseline.cash_on_hand - ar_delta(revenue, scenario.ar_days, baseline.dso_days);

    Ok(ProjectedKpis {
        revenue,
        gross_profit,
        opex,
        ebitda,
        ccc: scenario.cash_conversion_cycle(),
        cash,
        revenue_change_pct: percent_change(revenue, baseline.monthly_revenue, "monthlyRevenue")?,
        ebitda_change_pct: percent_change(ebitda, baseline.ebitda, "ebitda")?,
        cash_change_pct: percent_change(cash, baseline.cash_on_hand, "cashOnHand")?,
    })
}

/// Projects sampled parameters for one Monte Carlo trial.
pub fn project_trial(
    params: &TrialParameters,
    baseline: &BaselineSnapshot,
    model: StochasticModel,
) -> Trial {
    let revenue = projected_revenue(baseline.monthly_revenue, params.revenue_growth_pct);
    let gross_profit = revenue * params.gross_margin_pct / 100.0;
    let ebitda = gross_profit - model.opex(baseline, params.opex_change_pct);
    let cash = model.cash(baseline, revenue, params.ar_days);

    Trial {
        revenue_growth_pct: params.revenue_growth_pct,
        gross_margin_pct: params.gross_margin_pct,
        opex_change_pct: params.opex_change_pct,
        ar_days: params.ar_days,
        revenue,
        ebitda,
        cash,
    }
}

/// Projects every scenario for a side-by-side comparison table.
pub fn compare_scenarios(
    scenarios: &[ScenarioDefinition],
    baseline: &BaselineSnapshot,
) -> Result<Vec<(String, ProjectedKpis)>> {
    if scenarios.is_empty() {
        return Err(EngineError::InvalidInput("scenario list is empty".to_string()));
    }
    scenarios
        .iter()
        .map(|s| Ok((s.name.clone(), project(s, baseline)?)))
        .collect()
}

/// Deterministic projection of the probability-weighted scenario blend.
pub fn weighted_projection(
    scenarios: &[ScenarioDefinition],
    baseline: &BaselineSnapshot,
) -> Result<ProjectedKpis> {
    let aggregate = blender::blend(scenarios)?;
    project(&aggregate.as_scenario(), baseline)
}
