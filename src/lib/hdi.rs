use crate::error::{AbError, Result};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::Serialize;

pub const DEFAULT_HDI_PROB: f64 = 0.94;

/// Narrowest interval holding a given share of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HdiInterval {
    pub low: f64,
    pub high: f64,
}

impl HdiInterval {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Highest density interval of `samples` covering `prob` of the draws.
///
/// The samples are sorted and every window spanning `floor(prob * n)` positions
/// is scanned left to right; the narrowest one wins, ties going to the lowest start.
pub fn highest_density_interval(samples: &[f64], prob: f64) -> Result<HdiInterval> {
    if samples.is_empty() {
        return Err(AbError::InsufficientData);
    }
    if !prob.is_finite() || prob <= 0.0 {
        return Err(AbError::InvalidInput(format!(
            "HDI probability must be positive, got {}",
            prob
        )));
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(AbError::InvalidInput(
            "HDI samples must be finite".to_string(),
        ));
    }

    let n = samples.len();
    let inc = (prob * n as f64).floor() as usize;
    if inc >= n {
        return Err(AbError::DegenerateInterval { prob, n });
    }
    let n_windows = n - inc;

    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by_key(|&x| OrderedFloat(x));

    let start = (0..n_windows)
        .map(|i| sorted[i + inc] - sorted[i])
        .position_min_by_key(|&width| OrderedFloat(width))
        .ok_or(AbError::InsufficientData)?;

    Ok(HdiInterval {
        low: sorted[start],
        high: sorted[start + inc],
    })
}
