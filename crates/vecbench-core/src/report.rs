//! Structured results of a benchmark run.

use serde::Serialize;

use crate::config::BenchConfig;
use crate::corpus::Preview;
use crate::error::{Error, Result};
use crate::harness::Comparison;
use crate::simd_native::{Metric, SimdLevel};
use crate::verify::Verification;

/// Everything a run produced, ready for rendering or JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchReport {
    /// Effective configuration.
    pub config: BenchConfig,
    /// Seed the dataset was generated from. `None` for caller-supplied data.
    pub seed: Option<u64>,
    /// Detected hardware capability.
    pub simd_level: SimdLevel,
    /// Candidate kernel name.
    pub candidate: &'static str,
    /// Reference kernel name.
    pub reference: &'static str,
    /// Leading components of the query and first corpus rows.
    pub preview: Preview,
    /// Per-metric results, in configuration order.
    pub metrics: Vec<MetricReport>,
}

/// Verification and timing of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    /// Metric.
    pub metric: Metric,
    /// Equivalence check against the reference.
    pub verification: Verification,
    /// Reference vs candidate timing.
    pub timing: Comparison,
}

impl BenchReport {
    /// True when every metric verified without violations.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.metrics.iter().all(|m| m.verification.passed)
    }

    /// Report for `metric`, if it was run.
    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<&MetricReport> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
