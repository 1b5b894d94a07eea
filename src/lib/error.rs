use crate::counts::Variant;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: sample is empty")]
    InsufficientData,

    #[error("Degenerate interval: probability {prob} spans every one of the {n} samples")]
    DegenerateInterval { prob: f64, n: usize },

    #[error("Division by zero: variant {0} has no users")]
    DivisionByZero(Variant),
}

pub type Result<T> = std::result::Result<T, AbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AbError::InvalidInput("conversions exceed users".to_string());
        assert!(err.to_string().contains("conversions exceed users"));

        let err = AbError::DegenerateInterval { prob: 1.0, n: 10 };
        assert!(err.to_string().contains("10 samples"));

        let err = AbError::DivisionByZero(Variant::B);
        assert_eq!(err.to_string(), "Division by zero: variant B has no users");
    }
}
