//! Bayesian and frequentist statistics for two-variant conversion experiments.

pub mod analysis;
pub mod bayes;
pub mod config;
pub mod counts;
pub mod error;
pub mod frequentist;
pub mod hdi;
pub mod histogram;
pub mod posterior;

pub use analysis::{run_analysis, AnalysisResult};
pub use config::AnalysisConfig;
pub use counts::{Variant, VariantCounts};
pub use error::{AbError, Result};
