//! Normal Sampling
//!
//! Standard-normal draws through the Box-Muller transform:
//! ```text
//! Z = sqrt(-2 ln U1) * cos(2 pi U2),   U1, U2 ~ Uniform(0, 1)
//! ```
//! The generator is injected. Production runs use the thread-local
//! OS-seeded generator; tests pass a seeded `StdRng`.

use rand::rngs::ThreadRng;
use rand::Rng;
use rand_distr::{Distribution, Open01};
use std::f64::consts::PI;

/// Normal distribution sampled with Box-Muller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxMuller {
    mean: f64,
    std_dev: f64,
}

impl BoxMuller {
    /// A negative spread is taken as its magnitude.
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self {
            mean,
            std_dev: std_dev.abs(),
        }
    }
}

impl Distribution<f64> for BoxMuller {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.std_dev == 0.0 {
            return self.mean;
        }
        // Open01 excludes 0, so ln(u1) stays finite
        let u1: f64 = Open01.sample(rng);
        let u2: f64 = Open01.sample(rng);
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        self.mean + self.std_dev * z
    }
}

pub struct RandomSampler<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomSampler<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomSampler<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One draw from N(mean, std_dev^2). `std_dev == 0` returns `mean`.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        BoxMuller::new(mean, std_dev).sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::Normal;

    fn moments(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn test_zero_std_dev_returns_mean() {
        let mut sampler = RandomSampler::with_rng(StdRng::seed_from_u64(1));
        for _ in 0..100 {
            assert_eq!(sampler.normal(42.5, 0.0), 42.5);
        }
    }

    #[test]
    fn test_box_muller_moments() {
        let mut sampler = RandomSampler::with_rng(StdRng::seed_from_u64(7));
        let samples: Vec<f64> = (0..50_000).map(|_| sampler.normal(10.0, 2.0)).collect();
        let (mean, std_dev) = moments(&samples);

        assert!((mean - 10.0).abs() < 0.05, "mean {mean}");
        assert!((std_dev - 2.0).abs() < 0.05, "std dev {std_dev}");
        assert!(samples.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_matches_reference_normal() {
        let mut rng = StdRng::seed_from_u64(11);
        let reference = Normal::new(-3.0, 0.5).unwrap();
        let ours = BoxMuller::new(-3.0, 0.5);

        let a: Vec<f64> = (0..20_000).map(|_| reference.sample(&mut rng)).collect();
        let b: Vec<f64> = (0..20_000).map(|_| ours.sample(&mut rng)).collect();
        let (mean_a, sd_a) = moments(&a);
        let (mean_b, sd_b) = moments(&b);

        assert!((mean_a - mean_b).abs() < 0.03);
        assert!((sd_a - sd_b).abs() < 0.03);
    }

    #[test]
    fn test_negative_std_dev_is_magnitude() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples: Vec<f64> = (0..20_000)
            .map(|_| BoxMuller::new(0.0, -1.0).sample(&mut rng))
            .collect();
        let (_, std_dev) = moments(&samples);
        assert!((std_dev - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_thread_rng_sampler() {
        let mut sampler = RandomSampler::new();
        let x = sampler.normal(0.0, 1.0);
        assert!(x.is_finite());
    }
}
