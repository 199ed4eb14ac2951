//! Error types for vecbench.

use thiserror::Error;

use crate::simd_native::Metric;
use crate::verify::Violation;

/// Errors produced while preparing, verifying or timing a benchmark run.
#[derive(Error, Debug)]
pub enum Error {
    /// The corpus or query buffer could not be allocated.
    #[error("Memory allocation failed for {elements} f32 elements")]
    Allocation {
        /// Number of `f32` elements requested.
        elements: usize,
    },

    /// Candidate and reference kernels disagree beyond the tolerance.
    #[error("{0}")]
    ToleranceViolation(Box<Violation>),

    /// Both kernels produced a non-finite result (e.g. zero-norm cosine).
    #[error("Degenerate input for {metric} at vector {index}: both kernels returned a non-finite result")]
    DegenerateInput {
        /// Metric being verified.
        metric: Metric,
        /// Corpus index of the offending vector.
        index: usize,
    },

    /// A vector does not have the configured dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// The requested kernel is not available on this CPU.
    #[error("Unsupported kernel: {0}")]
    UnsupportedKernel(String),

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config or report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration sources could not be read or merged.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl Error {
    /// Process exit status for this error. Always non-zero.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToleranceViolation(_) | Self::DegenerateInput { .. } => 1,
            Self::Allocation { .. } => 3,
            Self::DimensionMismatch { .. }
            | Self::UnsupportedKernel(_)
            | Self::InvalidConfig(_)
            | Self::Config(_)
            | Self::Serialization(_) => 2,
        }
    }
}

/// Result type alias for vecbench operations.
pub type Result<T> = std::result::Result<T, Error>;
