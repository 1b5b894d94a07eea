use clap::{Parser, ValueEnum};

/// Bayesian and frequentist statistics for A/B conversion experiments.
#[derive(Parser, Debug)]
#[command(name = "abstat", version, about = "A/B test conversion statistics")]
pub struct Cli {
    #[arg(long, default_value = "1500", help = "Number of users in variant A")]
    pub users_a: u64,

    #[arg(long, default_value = "10", help = "Number of conversions in variant A")]
    pub conversions_a: u64,

    #[arg(long, default_value = "1500", help = "Number of users in variant B")]
    pub users_b: u64,

    #[arg(long, default_value = "20", help = "Number of conversions in variant B")]
    pub conversions_b: u64,

    #[arg(
        long,
        short,
        value_name = "INPUT",
        help = "Tab separated file with columns experiment, users_a, conversions_a, users_b, conversions_b. Overrides the count flags"
    )]
    pub input: Option<String>,

    #[arg(
        long,
        short,
        default_value = "abstat",
        value_name = "OUT",
        help = "Output directory, must not exist"
    )]
    pub out: String,

    #[arg(
        long,
        value_name = "CONFIG",
        help = "JSON file with analysis settings. Flags below take precedence"
    )]
    pub config: Option<String>,

    #[arg(long, help = "Posterior draws per variant [default: 10000]")]
    pub sample_size: Option<usize>,

    #[arg(long, help = "Probability mass of the highest density interval [default: 0.94]")]
    pub hdi_prob: Option<f64>,

    #[arg(long, help = "Significance level of the z-test [default: 0.05]")]
    pub alpha: Option<f64>,

    #[arg(long, help = "Seed for reproducible posterior draws")]
    pub seed: Option<u64>,

    #[arg(long, help = "Number of histogram bins [default: 50]")]
    pub bins: Option<usize>,

    #[arg(long, help = "Number of points on the expected distribution curves [default: 1000]")]
    pub curve_points: Option<usize>,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}
