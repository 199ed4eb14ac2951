//! Distribution statistics over divergence samples.

use serde::Serialize;

/// Index of the `percentile`-th element in a sorted sequence of `len` items.
///
/// Nearest-rank without interpolation: `floor((len - 1) * percentile / 100)`.
/// Returns 0 for empty input.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_index(len: usize, percentile: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let rank = (last as f64 * percentile / 100.0).floor();
    (rank.max(0.0) as usize).min(last)
}

/// Summary of one divergence series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    /// Smallest sample.
    pub min: f32,
    /// Arithmetic mean (accumulated in f64).
    pub mean: f32,
    /// 95th percentile, nearest rank.
    pub p95: f32,
    /// 99th percentile, nearest rank.
    pub p99: f32,
    /// Largest sample.
    pub max: f32,
}

impl Distribution {
    /// Summarizes `samples`, sorting them in place. `None` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn from_samples(samples: &mut [f32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable_by(f32::total_cmp);
        let sum: f64 = samples.iter().map(|&s| f64::from(s)).sum();
        let len = samples.len();
        Some(Self {
            min: samples[0],
            mean: (sum / len as f64) as f32,
            p95: samples[percentile_index(len, 95.0)],
            p99: samples[percentile_index(len, 99.0)],
            max: samples[len - 1],
        })
    }
}
