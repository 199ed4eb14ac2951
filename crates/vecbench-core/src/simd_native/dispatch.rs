//! Runtime SIMD capability detection and kernel selection.
//!
//! This module provides:
//! - `SimdLevel` for the detected hardware capability (cached)
//! - `CandidateKernel` / `Accumulation` configuration values
//! - `select_kernel()` which turns those values into a boxed [`MetricKernel`]

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::lanes::{LaneKernel, LaneWidth};
use super::MetricKernel;
use crate::error::{Error, Result};

// =============================================================================
// Cached SIMD Level Detection
// =============================================================================

/// SIMD capability level detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimdLevel {
    /// AVX2 + FMA available (x86_64 only).
    Avx2,
    /// NEON available (aarch64, always true).
    Neon,
    /// No supported vector ISA; portable kernels only.
    Scalar,
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Avx2 => "avx2+fma",
            Self::Neon => "neon",
            Self::Scalar => "scalar",
        })
    }
}

static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

fn detect_simd_level() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return SimdLevel::Neon;
    }

    #[allow(unreachable_code)]
    SimdLevel::Scalar
}

/// Returns the cached SIMD capability level.
#[inline]
#[must_use]
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(detect_simd_level)
}

/// Whether the CPU executes fused multiply-add in hardware.
///
/// Without it `f32::mul_add` falls back to a (slow) software routine, so
/// portable kernels switch to pairwise accumulation instead.
#[must_use]
pub fn has_hardware_fma() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("fma")
    }

    #[cfg(target_arch = "aarch64")]
    {
        true
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

// =============================================================================
// Kernel selection
// =============================================================================

/// Candidate (SIMD) kernel requested by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKernel {
    /// Best kernel for the detected `SimdLevel`.
    #[default]
    Auto,
    /// Portable kernel, one 4-lane register.
    Lanes4,
    /// Portable kernel, four 4-lane registers.
    Lanes16,
    /// AVX2+FMA intrinsics.
    Avx2,
    /// NEON intrinsics.
    Neon,
}

impl fmt::Display for CandidateKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Lanes4 => "lanes4",
            Self::Lanes16 => "lanes16",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        })
    }
}

impl FromStr for CandidateKernel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lanes4" | "x4" => Ok(Self::Lanes4),
            "lanes16" | "x16" => Ok(Self::Lanes16),
            "avx2" => Ok(Self::Avx2),
            "neon" => Ok(Self::Neon),
            other => Err(format!(
                "unknown kernel '{other}' (expected auto, lanes4, lanes16, avx2 or neon)"
            )),
        }
    }
}

/// How portable kernels fold products into their running sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Accumulation {
    /// Fused when the CPU has hardware FMA, pairwise otherwise.
    #[default]
    Auto,
    /// `mul_add` into every register (one rounding per step).
    Fused,
    /// Multiply, add register products pairwise, then accumulate. With
    /// 4-lane kernels there is one product per step, so this is a plain
    /// multiply then add.
    Pairwise,
}

impl fmt::Display for Accumulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Fused => "fused",
            Self::Pairwise => "pairwise",
        })
    }
}

impl FromStr for Accumulation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fused" | "fma" => Ok(Self::Fused),
            "pairwise" => Ok(Self::Pairwise),
            other => Err(format!(
                "unknown accumulation '{other}' (expected auto, fused or pairwise)"
            )),
        }
    }
}

/// Builds the candidate kernel for this CPU.
///
/// `Auto` picks the hardware kernel for the detected [`SimdLevel`] and falls
/// back to the 16-lane portable kernel. Explicit ISA requests fail with
/// [`Error::UnsupportedKernel`] when the CPU lacks the features.
pub fn select_kernel(
    candidate: CandidateKernel,
    accumulation: Accumulation,
) -> Result<Box<dyn MetricKernel>> {
    let kernel: Box<dyn MetricKernel> = match candidate {
        CandidateKernel::Auto => match simd_level() {
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => match super::Avx2Kernel::detect() {
                Some(kernel) => Box::new(kernel),
                None => Box::new(LaneKernel::new(LaneWidth::X16, accumulation)),
            },
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => Box::new(super::NeonKernel),
            _ => Box::new(LaneKernel::new(LaneWidth::X16, accumulation)),
        },
        CandidateKernel::Lanes4 => Box::new(LaneKernel::new(LaneWidth::X4, accumulation)),
        CandidateKernel::Lanes16 => Box::new(LaneKernel::new(LaneWidth::X16, accumulation)),
        CandidateKernel::Avx2 => avx2_kernel()?,
        CandidateKernel::Neon => neon_kernel()?,
    };
    tracing::debug!(
        requested = %candidate,
        selected = kernel.name(),
        level = %simd_level(),
        "candidate kernel selected"
    );
    Ok(kernel)
}

fn avx2_kernel() -> Result<Box<dyn MetricKernel>> {
    #[cfg(target_arch = "x86_64")]
    {
        if let Some(kernel) = super::Avx2Kernel::detect() {
            return Ok(Box::new(kernel));
        }
    }
    Err(Error::UnsupportedKernel(
        "avx2 requires an x86_64 CPU with AVX2 and FMA".to_string(),
    ))
}

fn neon_kernel() -> Result<Box<dyn MetricKernel>> {
    #[cfg(target_arch = "aarch64")]
    {
        return Ok(Box::new(super::NeonKernel));
    }

    #[allow(unreachable_code)]
    Err(Error::UnsupportedKernel(
        "neon requires an aarch64 CPU".to_string(),
    ))
}
