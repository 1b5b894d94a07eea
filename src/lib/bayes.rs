use crate::counts::VariantCounts;
use crate::error::Result;
use crate::hdi::{highest_density_interval, HdiInterval};
use crate::posterior::{sample_with_rng, seeded_rng, BetaPosterior, PosteriorSummary};
use log::debug;
use rand::Rng;
use serde::Serialize;

pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;

/// Monte Carlo comparison of two variant posteriors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BayesianComparison {
    #[serde(skip)]
    pub series_a: Vec<f64>,
    #[serde(skip)]
    pub series_b: Vec<f64>,
    /// `series_b[i] - series_a[i]`, paired by draw index
    #[serde(skip)]
    pub diff_series: Vec<f64>,
    pub posterior_a: PosteriorSummary,
    pub posterior_b: PosteriorSummary,
    pub diff_hdi: HdiInterval,
    pub prob_b_beats_a: f64,
    pub prob_a_beats_b: f64,
}

/// Compare the posteriors of `counts_a` and `counts_b`, drawing A before B from `rng`.
pub fn compare_with_rng<R: Rng + ?Sized>(
    counts_a: &VariantCounts,
    counts_b: &VariantCounts,
    sample_size: usize,
    hdi_prob: f64,
    rng: &mut R,
) -> Result<BayesianComparison> {
    let series_a = sample_with_rng(counts_a, sample_size, &mut *rng)?;
    let series_b = sample_with_rng(counts_b, sample_size, &mut *rng)?;

    let diff_series: Vec<f64> = series_b
        .iter()
        .zip(series_a.iter())
        .map(|(b, a)| b - a)
        .collect();
    let diff_hdi = highest_density_interval(&diff_series, hdi_prob)?;

    // Strictly greater only, ties fall to A through the complement
    let b_wins = series_b
        .iter()
        .zip(series_a.iter())
        .filter(|(b, a)| b > a)
        .count();
    let prob_b_beats_a = b_wins as f64 / sample_size as f64;
    let prob_a_beats_b = 1.0 - prob_b_beats_a;
    debug!(
        "B beats A in {} of {} draws, HDI of B - A: [{:.6}, {:.6}]",
        b_wins, sample_size, diff_hdi.low, diff_hdi.high
    );

    Ok(BayesianComparison {
        series_a,
        series_b,
        diff_series,
        posterior_a: BetaPosterior::from_counts(counts_a).summary(),
        posterior_b: BetaPosterior::from_counts(counts_b).summary(),
        diff_hdi,
        prob_b_beats_a,
        prob_a_beats_b,
    })
}

/// Compare two variants with a fresh generator, seeded when `seed` is given.
pub fn compare(
    counts_a: &VariantCounts,
    counts_b: &VariantCounts,
    sample_size: usize,
    hdi_prob: f64,
    seed: Option<u64>,
) -> Result<BayesianComparison> {
    let mut rng = seeded_rng(seed);
    compare_with_rng(counts_a, counts_b, sample_size, hdi_prob, &mut rng)
}
