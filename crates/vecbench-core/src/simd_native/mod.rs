//! Similarity kernels: scalar references and SIMD-accumulated candidates.
//!
//! Every kernel computes the same three metrics through [`MetricKernel`].
//! The candidates deliberately sum in a different order than the scalar
//! reference (lane-parallel running sums, horizontal reduction, scalar tail
//! added last), so their results diverge by a few ULPs. That divergence is
//! what the verifier measures; kernels keep their own order.
//!
//! # Module Structure
//!
//! - `scalar`: Index-order reference kernel (f64 internals for cosine)
//! - `lanes`: Portable 4-lane register model, 4 or 16 lanes wide
//! - `x86_avx2`: AVX2+FMA kernel (x86_64 only)
//! - `neon`: ARM NEON kernel (aarch64 only)
//! - `dispatch`: Runtime capability detection and kernel selection
#![allow(clippy::doc_markdown)] // Contains ISA/architecture nomenclature in docs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Unsafe Invariants Reference
// =============================================================================
// SAFETY: Shared invariants for SIMD unsafe blocks in this module tree.
// - Condition 1: All pointer arithmetic is derived from slice pointers with loop
//   bounds proving in-range access for each lane width.
// - Condition 2: Target-featured functions are called only from kernels that are
//   constructed after runtime feature checks, or on architectures where the
//   feature is guaranteed.
// - Condition 3: Loads use unaligned intrinsics (`_mm256_loadu_ps`, `vld1q_f32`).

pub mod lanes;
pub mod scalar;

#[cfg(target_arch = "x86_64")]
mod x86_avx2;

#[cfg(target_arch = "aarch64")]
mod neon;

mod dispatch;

pub use dispatch::{
    has_hardware_fma, select_kernel, simd_level, Accumulation, CandidateKernel, SimdLevel,
};
pub use lanes::{LaneKernel, LaneWidth};
pub use scalar::ScalarKernel;

#[cfg(target_arch = "x86_64")]
pub use x86_avx2::Avx2Kernel;

#[cfg(target_arch = "aarch64")]
pub use neon::NeonKernel;

/// Pairwise metric computed between a corpus vector and the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Σ (a[i] - b[i])²
    SquaredL2,
    /// Σ a[i] · b[i]
    InnerProduct,
    /// dot(a, b) / sqrt(‖a‖² · ‖b‖²)
    Cosine,
}

impl Metric {
    /// All metrics, in report order.
    pub const ALL: [Metric; 3] = [Metric::SquaredL2, Metric::InnerProduct, Metric::Cosine];

    /// Stable kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SquaredL2 => "squared-l2",
            Self::InnerProduct => "inner-product",
            Self::Cosine => "cosine",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "squared-l2" | "l2" | "l2sq" => Ok(Self::SquaredL2),
            "inner-product" | "ip" | "dot" => Ok(Self::InnerProduct),
            "cosine" | "cos" => Ok(Self::Cosine),
            other => Err(format!(
                "unknown metric '{other}' (expected squared-l2, inner-product or cosine)"
            )),
        }
    }
}

/// A set of pure similarity kernels sharing one accumulation strategy.
///
/// Implementations take the dimension from `a.len()` and panic when
/// `a.len() != b.len()`.
pub trait MetricKernel: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Squared Euclidean distance.
    fn squared_l2(&self, a: &[f32], b: &[f32]) -> f32;

    /// Inner (dot) product.
    fn inner_product(&self, a: &[f32], b: &[f32]) -> f32;

    /// Cosine similarity as `dot / sqrt(norm_a * norm_b)`.
    ///
    /// A zero-norm operand yields NaN; no clamping is applied.
    fn cosine(&self, a: &[f32], b: &[f32]) -> f32;

    /// Computes `metric` through the matching kernel method.
    #[inline]
    fn compute(&self, metric: Metric, a: &[f32], b: &[f32]) -> f32 {
        match metric {
            Metric::SquaredL2 => self.squared_l2(a, b),
            Metric::InnerProduct => self.inner_product(a, b),
            Metric::Cosine => self.cosine(a, b),
        }
    }
}

// =============================================================================
// Tests (separate files per project rules)
// =============================================================================



#[cfg(test)]
mod dispatch_tests;
