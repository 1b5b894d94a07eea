use crate::bayes::{compare, BayesianComparison};
use crate::config::AnalysisConfig;
use crate::counts::{Variant, VariantCounts};
use crate::error::{AbError, Result};
use crate::frequentist::{
    analyze, expected_distributions, z_test_defined, ExpectedDistributions, FrequentistResult,
};
use crate::histogram::{histogram, Histogram};
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Instant;

/// Histograms behind the conversion-rate and difference plots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosteriorHistograms {
    pub a: Histogram,
    pub b: Histogram,
    pub diff: Histogram,
}

/// Everything one A/B analysis produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub config: AnalysisConfig,
    pub counts_a: VariantCounts,
    pub counts_b: VariantCounts,
    pub bayesian: BayesianComparison,
    pub histograms: PosteriorHistograms,
    /// Absent when both conversion rates are 0 or 1
    pub frequentist: Option<FrequentistResult>,
    pub expected: Option<ExpectedDistributions>,
}

fn validate_counts(counts: &VariantCounts, variant: Variant) -> Result<()> {
    if counts.total_users() == 0 {
        return Err(AbError::DivisionByZero(variant));
    }
    Ok(())
}

/// Run the full Bayesian and frequentist analysis of two variants.
///
/// Inputs are checked up front, so a failure never leaves a half-built result.
pub fn run_analysis(
    counts_a: &VariantCounts,
    counts_b: &VariantCounts,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    config.validate()?;
    validate_counts(counts_a, Variant::A)?;
    validate_counts(counts_b, Variant::B)?;

    let timer = Instant::now();
    let frequentist = if z_test_defined(counts_a, counts_b) {
        Some(analyze(counts_a, counts_b, config.alpha)?)
    } else {
        warn!("Both conversion rates are 0 or 1, skipping the z-test");
        None
    };
    let expected = frequentist
        .as_ref()
        .map(|result| expected_distributions(result, config.curve_points))
        .transpose()?;
    debug!("Frequentist analysis finished in {:?}", timer.elapsed());

    let timer = Instant::now();
    let bayesian = compare(
        counts_a,
        counts_b,
        config.sample_size,
        config.hdi_prob,
        config.seed,
    )?;
    let histograms = PosteriorHistograms {
        a: histogram(&bayesian.series_a, config.histogram_bins)?,
        b: histogram(&bayesian.series_b, config.histogram_bins)?,
        diff: histogram(&bayesian.diff_series, config.histogram_bins)?,
    };
    debug!(
        "Bayesian comparison with {} draws finished in {:?}",
        config.sample_size,
        timer.elapsed()
    );

    match &frequentist {
        Some(freq) => info!(
            "P(B > A) = {:.4}, p value = {:.4}, power = {}%",
            bayesian.prob_b_beats_a, freq.p_value, freq.power
        ),
        None => info!("P(B > A) = {:.4}", bayesian.prob_b_beats_a),
    }

    Ok(AnalysisResult {
        config: config.clone(),
        counts_a: *counts_a,
        counts_b: *counts_b,
        bayesian,
        histograms,
        frequentist,
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(users: u64, conversions: u64) -> VariantCounts {
        VariantCounts::new(users, conversions).unwrap()
    }

    #[test]
    fn test_run_analysis() {
        let config = AnalysisConfig::default().with_seed(5);
        let result = run_analysis(&counts(1500, 10), &counts(1500, 20), &config).unwrap();

        assert_eq!(result.bayesian.series_a.len(), config.sample_size);
        assert_eq!(result.histograms.a.total(), config.sample_size as u64);
        assert_eq!(result.histograms.b.total(), config.sample_size as u64);
        assert_eq!(result.histograms.diff.total(), config.sample_size as u64);
        assert_eq!(result.histograms.diff.counts.len(), config.histogram_bins);
        assert_eq!(result.expected.as_ref().unwrap().x.len(), config.curve_points);
        assert_eq!(
            result.frequentist,
            Some(analyze(&counts(1500, 10), &counts(1500, 20), config.alpha).unwrap())
        );

        let again = run_analysis(&counts(1500, 10), &counts(1500, 20), &config).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_run_analysis_without_z_test() {
        let config = AnalysisConfig {
            sample_size: 500,
            ..AnalysisConfig::default().with_seed(2)
        };
        // No conversions anywhere: the z-test is undefined but the posteriors are not
        let result = run_analysis(&counts(100, 0), &counts(120, 0), &config).unwrap();
        assert!(result.frequentist.is_none());
        assert!(result.expected.is_none());
        assert_eq!(result.bayesian.series_a.len(), 500);
        assert_eq!(
            result.bayesian.prob_a_beats_b + result.bayesian.prob_b_beats_a,
            1.0
        );
        assert_eq!(result.histograms.diff.total(), 500);

        let result = run_analysis(&counts(40, 40), &counts(30, 30), &config).unwrap();
        assert!(result.frequentist.is_none());
        assert!(result.bayesian.posterior_a.mean > 0.9);
    }

    #[test]
    fn test_run_analysis_rejects_zero_users() {
        let config = AnalysisConfig::default();
        assert_eq!(
            run_analysis(&counts(0, 0), &counts(1500, 20), &config),
            Err(AbError::DivisionByZero(Variant::A))
        );
        assert_eq!(
            run_analysis(&counts(1500, 20), &counts(0, 0), &config),
            Err(AbError::DivisionByZero(Variant::B))
        );
    }

    #[test]
    fn test_run_analysis_rejects_bad_config() {
        let config = AnalysisConfig {
            hdi_prob: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            run_analysis(&counts(1500, 10), &counts(1500, 20), &config),
            Err(AbError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_result_serializes_without_raw_series() {
        let config = AnalysisConfig {
            sample_size: 200,
            curve_points: 5,
            histogram_bins: 4,
            ..AnalysisConfig::default().with_seed(1)
        };
        let result = run_analysis(&counts(200, 20), &counts(200, 30), &config).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["bayesian"].get("series_a").is_none());
        assert!(json["bayesian"]["prob_b_beats_a"].is_number());
        assert_eq!(json["counts_a"]["total_users"], 200);
        assert_eq!(json["histograms"]["diff"]["counts"].as_array().unwrap().len(), 4);
        assert_eq!(json["expected"]["x"].as_array().unwrap().len(), 5);
        assert_eq!(json["bayesian"]["posterior_a"]["alpha"], 21.0);
    }
}
