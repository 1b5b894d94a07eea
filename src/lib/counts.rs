use crate::error::{AbError, Result};
use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// Label of an experiment arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Variant {
    A,
    B,
}

/// Observed users and conversions of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantCounts {
    total_users: u64,
    conversions: u64,
}

impl VariantCounts {
    pub fn new(total_users: u64, conversions: u64) -> Result<Self> {
        if conversions > total_users {
            return Err(AbError::InvalidInput(format!(
                "conversions ({}) exceed total users ({})",
                conversions, total_users
            )));
        }
        Ok(Self {
            total_users,
            conversions,
        })
    }

    pub fn total_users(&self) -> u64 {
        self.total_users
    }

    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    pub fn failures(&self) -> u64 {
        self.total_users - self.conversions
    }

    /// Observed conversion rate, `None` for a variant without users.
    pub fn rate(&self) -> Option<f64> {
        match self.total_users {
            0 => None,
            n => Some(self.conversions as f64 / n as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_new() {
        let counts = VariantCounts::new(1500, 10).unwrap();
        assert_eq!(counts.total_users(), 1500);
        assert_eq!(counts.conversions(), 10);
        assert_eq!(counts.failures(), 1490);

        // Zero users is a valid observation
        assert!(VariantCounts::new(0, 0).is_ok());
        assert!(VariantCounts::new(5, 5).is_ok());

        // More conversions than users
        let err = VariantCounts::new(5, 6).unwrap_err();
        assert!(matches!(err, AbError::InvalidInput(_)));
    }

    #[test]
    fn test_rate() {
        assert_eq!(VariantCounts::new(0, 0).unwrap().rate(), None);
        assert_eq!(VariantCounts::new(4, 1).unwrap().rate(), Some(0.25));
    }

    #[test]
    fn test_variant_display() {
        let labels: Vec<String> = Variant::iter().map(|v| v.to_string()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }
}
