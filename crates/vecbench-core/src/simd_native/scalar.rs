//! Scalar reference kernel.
//!
//! These loops accumulate strictly in index order with no reassociation, so
//! they serve as the ground truth the SIMD kernels are compared against.
//! Float reductions are not auto-vectorized by LLVM without fast-math, so the
//! summation order seen here is the order actually executed.

use super::MetricKernel;

/// Index-order reference implementation of every metric.
///
/// Cosine accumulates its three running sums in `f64` even though inputs are
/// `f32`, and only narrows the final quotient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarKernel;

impl MetricKernel for ScalarKernel {
    fn name(&self) -> &'static str {
        "scalar"
    }

    #[inline]
    fn squared_l2(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        let mut distance = 0.0_f32;
        for (x, y) in a.iter().zip(b.iter()) {
            let diff = x - y;
            distance += diff * diff;
        }
        distance
    }

    #[inline]
    fn inner_product(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        let mut dot = 0.0_f32;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
        }
        dot
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)] // f64 internals are narrowed once at the end.
    fn cosine(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        let mut dot = 0.0_f64;
        let mut norm_a = 0.0_f64;
        let mut norm_b = 0.0_f64;

        for (&x, &y) in a.iter().zip(b.iter()) {
            let x = f64::from(x);
            let y = f64::from(y);
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        (dot / (norm_a * norm_b).sqrt()) as f32
    }
}
