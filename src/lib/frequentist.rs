use crate::counts::{Variant, VariantCounts};
use crate::error::{AbError, Result};
use log::{debug, warn};
use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

pub const DEFAULT_ALPHA: f64 = 0.05;
pub const DEFAULT_CURVE_POINTS: usize = 1000;

/// Two-proportion z-test and power of an A/B experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentistResult {
    pub rate_a: f64,
    pub rate_b: f64,
    /// Relative change of B over A, absent when A never converts
    pub uplift: Option<f64>,
    pub z: f64,
    /// Two-sided critical value at the configured alpha
    pub z_alpha: f64,
    /// Upper-tail probability of `z`, folded into [0, 0.5]
    pub p_value: f64,
    pub std_err_a: f64,
    pub std_err_b: f64,
    /// Acceptance region around `rate_a`
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Mass of B's sampling distribution below `ci_lower`
    pub lower_a: f64,
    /// Mass of B's sampling distribution above `ci_upper`
    pub upper_a: f64,
    /// Percentage, rounded to 2 decimals
    pub power: f64,
}

/// Normal densities of both rate estimates over a shared grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedDistributions {
    pub x: Vec<f64>,
    pub density_a: Option<Vec<f64>>,
    pub density_b: Option<Vec<f64>>,
}

fn rate_of(counts: &VariantCounts, variant: Variant) -> Result<f64> {
    counts.rate().ok_or(AbError::DivisionByZero(variant))
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal> {
    Normal::new(mean, std_dev).map_err(|e| AbError::InvalidInput(e.to_string()))
}

/// CDF of N(mean, std_dev), treating a zero deviation as a point mass at `mean`
fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> Result<f64> {
    if std_dev == 0.0 {
        return Ok(if x < mean { 0.0 } else { 1.0 });
    }
    Ok(normal(mean, std_dev)?.cdf(x))
}

/// Whether the z-test has a non-zero standard error, false when both rates are 0 or 1
pub fn z_test_defined(counts_a: &VariantCounts, counts_b: &VariantCounts) -> bool {
    let varies = |c: &VariantCounts| c.conversions() > 0 && c.conversions() < c.total_users();
    varies(counts_a) || varies(counts_b)
}

/// Run the two-proportion z-test of `counts_b` against `counts_a`.
///
/// The p-value is the survival probability of `z` under the standard normal,
/// replaced by its complement whenever it exceeds 0.5. Power is the chance that
/// B's sampling distribution falls outside A's `1 - alpha` acceptance region.
pub fn analyze(
    counts_a: &VariantCounts,
    counts_b: &VariantCounts,
    alpha: f64,
) -> Result<FrequentistResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AbError::InvalidInput(format!(
            "alpha must lie in (0, 1), got {}",
            alpha
        )));
    }
    let rate_a = rate_of(counts_a, Variant::A)?;
    let rate_b = rate_of(counts_b, Variant::B)?;
    let total_a = counts_a.total_users() as f64;
    let total_b = counts_b.total_users() as f64;

    let var_a = rate_a * (1.0 - rate_a);
    let var_b = rate_b * (1.0 - rate_b);
    if !z_test_defined(counts_a, counts_b) {
        return Err(AbError::InvalidInput(
            "both conversion rates are 0 or 1, the z-test has zero variance".to_string(),
        ));
    }
    let z = (rate_b - rate_a) / (var_b / total_b + var_a / total_a).sqrt();

    let standard = normal(0.0, 1.0)?;
    let z_alpha = standard.inverse_cdf(1.0 - alpha / 2.0);
    let mut p_value = standard.sf(z);
    if p_value > 0.5 {
        p_value = 1.0 - p_value;
    }

    let std_err_a = (var_a / total_a).sqrt();
    let std_err_b = (var_b / total_b).sqrt();
    let ci_lower = rate_a - z_alpha * std_err_a;
    let ci_upper = rate_a + z_alpha * std_err_a;

    let lower_a = normal_cdf(ci_lower, rate_b, std_err_b)?;
    let upper_a = 1.0 - normal_cdf(ci_upper, rate_b, std_err_b)?;
    let power = (100.0 * (lower_a + upper_a) * 100.0).round() / 100.0;

    let uplift = if rate_a > 0.0 {
        Some((rate_b - rate_a) / rate_a)
    } else {
        debug!("Variant A has no conversions, uplift is undefined");
        None
    };

    Ok(FrequentistResult {
        rate_a,
        rate_b,
        uplift,
        z,
        z_alpha,
        p_value,
        std_err_a,
        std_err_b,
        ci_lower,
        ci_upper,
        lower_a,
        upper_a,
        power,
    })
}

/// Evaluate the normal approximation of each rate on `points` values from 0 to `rate_a + 1.5 * rate_b`.
pub fn expected_distributions(
    result: &FrequentistResult,
    points: usize,
) -> Result<ExpectedDistributions> {
    if points < 2 {
        return Err(AbError::InvalidInput(format!(
            "curve needs at least 2 points, got {}",
            points
        )));
    }
    let end = result.rate_a + result.rate_b * 1.5;
    let step = end / (points - 1) as f64;
    let x: Vec<f64> = (0..points).map(|i| i as f64 * step).collect();

    let density = |variant: Variant, mean: f64, std_dev: f64| -> Result<Option<Vec<f64>>> {
        if std_dev == 0.0 {
            warn!(
                "Variant {} has zero standard error, skipping its expected distribution",
                variant
            );
            return Ok(None);
        }
        let dist = normal(mean, std_dev)?;
        Ok(Some(x.iter().map(|&xi| dist.pdf(xi)).collect()))
    };
    let density_a = density(Variant::A, result.rate_a, result.std_err_a)?;
    let density_b = density(Variant::B, result.rate_b, result.std_err_b)?;

    Ok(ExpectedDistributions {
        x,
        density_a,
        density_b,
    })
}
