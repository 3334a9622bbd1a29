//! Trial Generation
//!
//! Each trial perturbs the blended parameters with normal noise whose spread
//! is half the ScenarioSpread, then clamps the draws to usable ranges.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::blender::AggregateParameters;
use crate::sampler::RandomSampler;

/// Trials cluster tighter than the widest scenario disagreement.
pub const SPREAD_DAMPENING: f64 = 2.0;
pub const MIN_GROSS_MARGIN_PCT: f64 = 10.0;
pub const MAX_GROSS_MARGIN_PCT: f64 = 60.0;
pub const MIN_AR_DAYS: f64 = 15.0;

/// Sampled inputs for one trial, before projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialParameters {
    pub revenue_growth_pct: f64,
    pub gross_margin_pct: f64,
    pub opex_change_pct: f64,
    pub ar_days: f64,
}

/// One Monte Carlo sample with its projected outputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub revenue_growth_pct: f64,
    pub gross_margin_pct: f64,
    pub opex_change_pct: f64,
    pub ar_days: f64,
    pub revenue: f64,
    pub ebitda: f64,
    pub cash: f64,
}

pub struct TrialGenerator {
    aggregate: AggregateParameters,
}

impl TrialGenerator {
    pub fn new(aggregate: AggregateParameters) -> Self {
        Self { aggregate }
    }

    pub fn aggregate(&self) -> &AggregateParameters {
        &self.aggregate
    }

    pub fn sample<R: Rng>(&self, sampler: &mut RandomSampler<R>) -> TrialParameters {
        let agg = &self.aggregate;
        let spread = &agg.spread;

        let revenue_growth_pct = sampler.normal(
            agg.revenue_growth_pct,
            spread.revenue_growth_pct / SPREAD_DAMPENING,
        );
        let gross_margin_pct = sampler
            .normal(agg.gross_margin_pct, spread.gross_margin_pct / SPREAD_DAMPENING)
            .clamp(MIN_GROSS_MARGIN_PCT, MAX_GROSS_MARGIN_PCT);
        let opex_change_pct = sampler.normal(
            agg.opex_change_pct,
            spread.opex_change_pct / SPREAD_DAMPENING,
        );
        let ar_days = sampler
            .normal(agg.ar_days, spread.ar_days / SPREAD_DAMPENING)
            .max(MIN_AR_DAYS);

        TrialParameters {
            revenue_growth_pct,
            gross_margin_pct,
            opex_change_pct,
            ar_days,
        }
    }
}
