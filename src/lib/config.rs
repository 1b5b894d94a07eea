use crate::bayes::DEFAULT_SAMPLE_SIZE;
use crate::error::{AbError, Result};
use crate::frequentist::{DEFAULT_ALPHA, DEFAULT_CURVE_POINTS};
use crate::hdi::DEFAULT_HDI_PROB;
use crate::histogram::DEFAULT_BINS;
use serde::{Deserialize, Serialize};

/// Tunables of a single analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_size: usize,
    pub hdi_prob: f64,
    pub alpha: f64,
    pub seed: Option<u64>,
    pub histogram_bins: usize,
    pub curve_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            hdi_prob: DEFAULT_HDI_PROB,
            alpha: DEFAULT_ALPHA,
            seed: None,
            histogram_bins: DEFAULT_BINS,
            curve_points: DEFAULT_CURVE_POINTS,
        }
    }
}

impl AnalysisConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(AbError::InvalidInput(
                "sample size must be at least 1".to_string(),
            ));
        }
        if !(self.hdi_prob > 0.0 && self.hdi_prob < 1.0) {
            return Err(AbError::InvalidInput(format!(
                "HDI probability must lie in (0, 1), got {}",
                self.hdi_prob
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AbError::InvalidInput(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.histogram_bins == 0 {
            return Err(AbError::InvalidInput(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if self.curve_points < 2 {
            return Err(AbError::InvalidInput(format!(
                "curve needs at least 2 points, got {}",
                self.curve_points
            )));
        }
        Ok(())
    }
}
