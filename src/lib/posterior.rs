use crate::counts::VariantCounts;
use crate::error::{AbError, Result};
use log::debug;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use statrs::distribution::Beta;

/// A Beta-Binomial posterior over a conversion rate
#[derive(Clone, Debug, PartialEq)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    /// Uniform prior, alpha=1.0, beta=1.0
    pub fn new() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Posterior after observing `counts` under the uniform prior
    pub fn from_counts(counts: &VariantCounts) -> Self {
        let mut posterior = Self::new();
        posterior.update(counts.conversions(), counts.failures());
        posterior
    }

    /// Update parameters with `successes` conversions and `failures` non-conversions
    pub fn update(&mut self, successes: u64, failures: u64) {
        self.alpha += successes as f64;
        self.beta += failures as f64;
    }

    /// Expected conversion rate
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn standard_deviation(&self) -> f64 {
        let mean = self.mean();
        (mean * (1.0 - mean) / (self.alpha + self.beta + 1.0)).sqrt()
    }

    pub fn summary(&self) -> PosteriorSummary {
        PosteriorSummary {
            alpha: self.alpha,
            beta: self.beta,
            mean: self.mean(),
            std_dev: self.standard_deviation(),
        }
    }

    fn distribution(&self) -> Result<Beta> {
        Beta::new(self.alpha, self.beta).map_err(|e| AbError::InvalidInput(e.to_string()))
    }
}

/// Closed-form description of a variant posterior, as reported next to the draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PosteriorSummary {
    pub alpha: f64,
    pub beta: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for BetaPosterior {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw `count` conversion rates from the posterior of `counts` using the given generator.
pub fn sample_with_rng<R: Rng + ?Sized>(
    counts: &VariantCounts,
    count: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if counts.total_users() == 0 {
        return Err(AbError::InvalidInput(
            "cannot sample a posterior for a variant without users".to_string(),
        ));
    }
    if count == 0 {
        return Err(AbError::InvalidInput(
            "sample count must be at least 1".to_string(),
        ));
    }
    let posterior = BetaPosterior::from_counts(counts);
    debug!(
        "Sampling {} draws from Beta({}, {})",
        count, posterior.alpha, posterior.beta
    );
    let distribution = posterior.distribution()?;
    Ok((0..count).map(|_| distribution.sample(&mut *rng)).collect())
}

/// Draw `count` conversion rates for a variant with `total_users` users and `conversions` conversions.
///
/// A seed makes the draws reproducible, otherwise the generator is seeded from entropy.
pub fn sample(
    total_users: u64,
    conversions: u64,
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<f64>> {
    let counts = VariantCounts::new(total_users, conversions)?;
    let mut rng = seeded_rng(seed);
    sample_with_rng(&counts, count, &mut rng)
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
