//! Result Aggregation
//!
//! Turns the trials of one run into the distribution the dashboard renders.
//!
//! ## Metrics (over EBITDA)
//! - Percentiles p5/p25/p50/p75/p95, nearest rank (no interpolation)
//! - Mean, population standard deviation, min, max
//! - Value at Risk (VaR) at 95%: the 5th percentile
//! - Conditional VaR at 95%: mean of outcomes at or below VaR
//!
//! ## Histograms
//! Revenue, cash and EBITDA are binned independently over each series' own
//! min/max, so bins from two runs do not line up. Compare runs through the
//! percentiles and statistics instead.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::trial::Trial;

pub const DEFAULT_BINS: usize = 30;
pub const RETAINED_TRIALS: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub value: f64,     // bin midpoint
    pub frequency: f64, // percent of trials in the bin
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub var95: f64,
    pub cvar95: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub num_trials: usize,
    pub revenue_histogram: Vec<HistogramBin>,
    pub cash_histogram: Vec<HistogramBin>,
    pub ebitda_histogram: Vec<HistogramBin>,
    pub percentiles: Percentiles,
    pub statistics: Statistics,
    pub simulations: Vec<Trial>,
}

impl MonteCarloResult {
    pub fn print(&self) {
        println!("  Trials:                  {}", self.num_trials);
        println!("  Mean EBITDA:             {:.0}", self.statistics.mean);
        println!("  Std dev EBITDA:          {:.0}", self.statistics.std_dev);
        println!("  Min EBITDA:              {:.0}", self.statistics.min);
        println!("  Max EBITDA:              {:.0}", self.statistics.max);
        println!("  P5:                      {:.0}", self.percentiles.p5);
        println!("  P25:                     {:.0}", self.percentiles.p25);
        println!("  P50:                     {:.0}", self.percentiles.p50);
        println!("  P75:                     {:.0}", self.percentiles.p75);
        println!("  P95:                     {:.0}", self.percentiles.p95);
        println!("  VaR 95%:                 {:.0}", self.statistics.var95);
        println!("  CVaR 95%:                {:.0}", self.statistics.cvar95);
    }
}

/// Nearest-rank percentile of an ascending slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * p / 100.0).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Mean of the values at or below `threshold`; `threshold` itself if none qualify.
pub fn conditional_mean_below(sorted: &[f64], threshold: f64) -> f64 {
    let tail: Vec<f64> = sorted.iter().copied().filter(|&v| v <= threshold).collect();
    if tail.is_empty() {
        return threshold;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Equal-width histogram over the series' own range. Frequencies are percentages.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = if width > 0.0 {
            ((v - min) / width).floor() as usize
        } else {
            0
        };
        // the maximum lands on the upper edge of the last bin
        counts[idx.min(bins - 1)] += 1;
    }

    let n = values.len() as f64;
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| HistogramBin {
            value: min + (i as f64 + 0.5) * width,
            frequency: count as f64 / n * 100.0,
        })
        .collect()
}

fn statistics(sorted: &[f64]) -> Statistics {
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let var95 = percentile(sorted, 5.0);

    Statistics {
        mean,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        var95,
        cvar95: conditional_mean_below(sorted, var95),
    }
}

/// Accumulates trials in generation order.
pub struct ResultAggregator {
    bins: usize,
    retained: usize,
    trials: Vec<Trial>,
}

impl ResultAggregator {
    pub fn new(bins: usize, retained: usize) -> Self {
        Self {
            bins,
            retained,
            trials: Vec::new(),
        }
    }

    pub fn with_capacity(bins: usize, retained: usize, trials: usize) -> Self {
        Self {
            bins,
            retained,
            trials: Vec::with_capacity(trials),
        }
    }

    pub fn push(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn finish(self) -> Result<MonteCarloResult> {
        if self.trials.is_empty() {
            return Err(EngineError::InvalidInput("no trials to aggregate".to_string()));
        }
        if self.bins == 0 {
            return Err(EngineError::InvalidInput("histogram needs at least one bin".to_string()));
        }

        let revenue: Vec<f64> = self.trials.iter().map(|t| t.revenue).collect();
        let cash: Vec<f64> = self.trials.iter().map(|t| t.cash).collect();
        let mut ebitda: Vec<f64> = self.trials.iter().map(|t| t.ebitda).collect();
        ebitda.sort_by(|a, b| a.total_cmp(b));

        let percentiles = Percentiles {
            p5: percentile(&ebitda, 5.0),
            p25: percentile(&ebitda, 25.0),
            p50: percentile(&ebitda, 50.0),
            p75: percentile(&ebitda, 75.0),
            p95: percentile(&ebitda, 95.0),
        };

        let num_trials = self.trials.len();
        let mut simulations = self.trials;
        simulations.truncate(self.retained);

        Ok(MonteCarloResult {
            num_trials,
            revenue_histogram: histogram(&revenue, self.bins),
            cash_histogram: histogram(&cash, self.bins),
            ebitda_histogram: histogram(&ebitda, self.bins),
            percentiles,
            statistics: statistics(&ebitda),
            simulations,
        })
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, RETAINED_TRIALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(ebitda: f64) -> Trial {
        Trial {
            revenue_growth_pct: 0.0,
            gross_margin_pct: 35.0,
            opex_change_pct: 0.0,
            ar_days: 45.0,
            revenue: ebitda * 5.0,
            ebitda,
            cash: 1_000.0 - ebitda,
        }
    }

    #[test]
    fn test_nearest_rank_percentile() {
        let sorted: Vec<f64> = (0..100).map(|i| i as f64 * 100.0).collect();

        assert_eq!(percentile(&sorted, 5.0), 500.0);
        assert_eq!(percentile(&sorted, 50.0), 5000.0);
        assert_eq!(percentile(&sorted, 95.0), 9500.0);
        assert_eq!(percentile(&sorted, 100.0), 9900.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_histogram_includes_maximum() {
        let values: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let bins = histogram(&values, 5);

        assert_eq!(bins.len(), 5);
        let total: f64 = bins.iter().map(|b| b.frequency).sum();
        assert!((total - 100.0).abs() < 1e-9);
        // 8, 9 and 10 share the closed last bin
        assert!((bins[4].frequency - 3.0 / 11.0 * 100.0).abs() < 1e-9);
        assert!((bins[0].value - 1.0).abs() < 1e-9);
        assert!((bins[4].value - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_single_point_series() {
        let bins = histogram(&[7.0, 7.0, 7.0], 30);

        assert_eq!(bins.len(), 30);
        assert_eq!(bins[0].frequency, 100.0);
        assert!(bins[1..].iter().all(|b| b.frequency == 0.0));
        assert!(bins.iter().all(|b| b.value == 7.0));
    }

    #[test]
    fn test_statistics_and_tail_risk() {
        let mut agg = ResultAggregator::default();
        for i in (1..=100).rev() {
            agg.push(trial(i as f64));
        }
        let result = agg.finish().unwrap();
        let stats = result.statistics;

        assert_eq!(result.num_trials, 100);
        assert!((stats.mean - 50.5).abs() < 1e-9);
        assert!((stats.std_dev - (9999.0f64 / 12.0).sqrt()).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.var95, 6.0);
        // mean of 1..=6
        assert!((stats.cvar95 - 3.5).abs() < 1e-9);
        assert!(stats.min <= stats.cvar95);
        assert!(stats.cvar95 <= stats.var95);
        assert!(stats.var95 <= result.percentiles.p50);
    }

    #[test]
    fn test_retains_first_trials_in_generation_order() {
        let mut agg = ResultAggregator::new(DEFAULT_BINS, 3);
        for i in 0..10 {
            agg.push(trial(100.0 - i as f64));
        }
        let result = agg.finish().unwrap();

        assert_eq!(result.simulations.len(), 3);
        assert_eq!(result.simulations[0].ebitda, 100.0);
        assert_eq!(result.simulations[2].ebitda, 98.0);
    }

    #[test]
    fn test_empty_aggregator_is_invalid() {
        assert!(matches!(
            ResultAggregator::default().finish(),
            Err(EngineError::InvalidInput(_))
        ));

        let mut zero_bins = ResultAggregator::new(0, RETAINED_TRIALS);
        zero_bins.push(trial(1.0));
        assert!(zero_bins.finish().is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let mut agg = ResultAggregator::default();
        agg.push(trial(10.0));
        let json = serde_json::to_value(agg.finish().unwrap()).unwrap();

        assert!(json["statistics"]["stdDev"].is_number());
        assert!(json["statistics"]["cvar95"].is_number());
        assert!(json["percentiles"]["p50"].is_number());
        assert_eq!(json["ebitdaHistogram"].as_array().unwrap().len(), DEFAULT_BINS);
        assert!(json["simulations"][0]["grossMarginPct"].is_number());
    }
}
