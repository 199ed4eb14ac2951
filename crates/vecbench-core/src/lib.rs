//! # vecbench Core
//!
//! Verification and timing of SIMD vector-similarity kernels.
//!
//! A run generates a synthetic embedding corpus, checks a SIMD candidate
//! kernel against a scalar reference on every `(row, query)` pair, and then
//! times both over the same inputs.
//!
//! ## Features
//!
//! - **3 Metrics**: squared Euclidean distance, inner product, cosine similarity
//! - **Runtime Dispatch**: AVX2+FMA on x86_64, NEON on aarch64, portable
//!   4/16-lane kernels everywhere
//! - **Two Verification Modes**: fail-fast or full-scan with min/mean/p95/p99/max
//! - **Reproducible Data**: seeded `StdRng`, seed echoed in every report
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vecbench_core::{BenchConfig, BenchRunner};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BenchConfig {
//!         dimension: 768,
//!         corpus_size: 1_000,
//!         iterations: 10,
//!         seed: Some(42),
//!         ..BenchConfig::default()
//!     };
//!
//!     let report = BenchRunner::new(config)?.run()?;
//!     for metric in &report.metrics {
//!         println!("{}: {:.2}x", metric.metric, metric.timing.speedup);
//!     }
//!     # Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::float_cmp,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::unwrap_used,
        clippy::expect_used
    )
)]

pub mod config;
#[cfg(test)]
mod config_tests;
pub mod corpus;
#[cfg(test)]
mod corpus_tests;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod harness;
pub mod report;
pub mod runner;
pub mod simd_native;
pub mod stats;
#[cfg(test)]
mod stats_tests;
pub mod verify;

pub use config::{BenchConfig, KernelConfig, ToleranceConfig};
pub use corpus::{Corpus, CorpusGenerator, Dataset, Preview};
pub use error::{Error, Result};
pub use harness::{Clock, Comparison, MonotonicClock, Timing, TimingHarness};
pub use report::{BenchReport, MetricReport};
pub use runner::BenchRunner;
pub use simd_native::{
    select_kernel, simd_level, Accumulation, CandidateKernel, Metric, MetricKernel,
    ScalarKernel, SimdLevel,
};
pub use stats::Distribution;
pub use verify::{rounding_noise, Tolerance, Verification, Verifier, VerifyMode, Violation};
