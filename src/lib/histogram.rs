use crate::error::{AbError, Result};
use itertools::Itertools;
use itertools::MinMaxResult;
use serde::Serialize;

pub const DEFAULT_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(start, end, count)` per bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        self.edges
            .iter()
            .tuple_windows::<(&f64, &f64)>()
            .zip(self.counts.iter())
            .map(|((&start, &end), &count)| (start, end, count))
    }
}

/// Equal-width histogram over `[min, max]` of `samples`; the last bin includes `max`.
pub fn histogram(samples: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(AbError::InvalidInput(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(AbError::InvalidInput(
            "histogram samples must be finite".to_string(),
        ));
    }
    let (min, max) = match samples.iter().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => return Err(AbError::InsufficientData),
        MinMaxResult::OneElement(&x) => (x, x),
        MinMaxResult::MinMax(&lo, &hi) => (lo, hi),
    };

    if min == max {
        return Ok(Histogram {
            edges: vec![min, max],
            counts: vec![samples.len() as u64],
        });
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for &x in samples {
        let idx = (((x - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let mut edges: Vec<f64> = (0..bins).map(|i| min + i as f64 * width).collect();
    edges.push(max);

    Ok(Histogram { edges, counts })
}
