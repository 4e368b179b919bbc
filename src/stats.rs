//! Summary statistics over duration samples.
//!
//! The index formulas are fixed so reports stay comparable with earlier
//! runs:
//!
//! - median is `sorted[n / 2]`, the upper median for even `n` (no averaging
//!   of the two middle values);
//! - `pXX` is `sorted[floor(n * 0.XX)]`, clamped to the last index;
//! - standard deviation is the population form (divide by `n`).

use crate::error::{ReportError, Result};
use crate::schema::Statistics;

pub fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u128 = values.iter().map(|&v| u128::from(v)).sum();
    sum as f64 / values.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn std_dev(values: &[u64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Index used for quantile `q` over `len` sorted values.
pub fn quantile_index(len: usize, q: f64) -> usize {
    let idx = (len as f64 * q).floor() as usize;
    idx.min(len.saturating_sub(1))
}

pub fn quantile(sorted: &[u64], q: f64) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[quantile_index(sorted.len(), q)])
}

pub fn median(sorted: &[u64]) -> Option<u64> {
    sorted.get(sorted.len() / 2).copied()
}

impl Statistics {
    /// Summarise `durations` (nanoseconds, any order).
    pub fn from_durations(durations: &[u64]) -> Result<Self> {
        if durations.is_empty() {
            return Err(ReportError::invalid(
                "cannot summarise an empty duration sequence",
            ));
        }

        let mut sorted = durations.to_vec();
        sorted.sort_unstable();

        let mean = mean(durations);
        let last = sorted[sorted.len() - 1];

        Ok(Self {
            mean,
            median: median(&sorted).unwrap_or(last),
            std_dev: std_dev(durations, mean),
            p95: quantile(&sorted, 0.95).unwrap_or(last),
            p99: quantile(&sorted, 0.99).unwrap_or(last),
        })
    }
}
