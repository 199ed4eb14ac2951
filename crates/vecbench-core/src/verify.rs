//! Equivalence verification between a candidate and a reference kernel.
//!
//! Every corpus row is paired with the query and evaluated by both kernels.
//! The reference (scalar) result is ground truth: relative divergence is
//! `|candidate - reference| / |reference| * 100`. Dividing by the candidate
//! instead would change which pairs pass when the two straddle the limit.
//!
//! A relative limit alone rejects correct kernels whenever the exact value
//! sits near zero through cancellation, because single-precision rounding
//! noise does not shrink with the result. Each pair therefore also gets an
//! absolute floor of `noise_factor` times the estimated rounding noise of the
//! pair (see [`rounding_noise`]), never less than `zero_threshold`. A pair
//! whose relative allowance falls below that floor is judged on the absolute
//! difference instead.
//!
//! Two modes share one pass:
//! - `FailFast` returns [`Error::ToleranceViolation`] at the first offending row.
//! - `FullScan` records every violation and summarizes the whole distribution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::simd_native::{Metric, MetricKernel};
use crate::stats::Distribution;

/// Default `zero_threshold`: smallest absolute floor, and the reference
/// magnitude at or below which no relative difference is recorded.
pub const DEFAULT_ZERO_THRESHOLD: f32 = 1.0e-6;

/// Default `noise_factor`: multiple of [`rounding_noise`] always accepted.
pub const DEFAULT_NOISE_FACTOR: f32 = 2.0;

/// First-order rounding error scale of a left-to-right f32 sum of `terms`:
/// `eps * sqrt(sum(S_k^2) + sum(t_k^2))` over the exact prefix sums `S_k`.
fn summation_noise(terms: impl Iterator<Item = f64>) -> f64 {
    let mut prefix = 0.0_f64;
    let mut energy = 0.0_f64;
    for term in terms {
        prefix += term;
        energy += prefix * prefix + term * term;
    }
    f64::from(f32::EPSILON) * energy.sqrt()
}

/// Estimated single-precision rounding noise of `metric(a, b)`.
///
/// Summation noise grows with the partial sums, not with the final result,
/// so an inner product that cancels to almost zero keeps the noise of its
/// large intermediate values. Cosine combines the dot-product noise scaled by
/// the norms with the relative noise of both norms. Zero-norm inputs give 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rounding_noise(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    let pairs = || a.iter().zip(b).map(|(&x, &y)| (f64::from(x), f64::from(y)));
    let noise = match metric {
        Metric::SquaredL2 => summation_noise(pairs().map(|(x, y)| (x - y) * (x - y))),
        Metric::InnerProduct => summation_noise(pairs().map(|(x, y)| x * y)),
        Metric::Cosine => {
            let norm_a: f64 = pairs().map(|(x, _)| x * x).sum();
            let norm_b: f64 = pairs().map(|(_, y)| y * y).sum();
            let denominator = (norm_a * norm_b).sqrt();
            if !denominator.is_normal() {
                return 0.0;
            }
            let dot: f64 = pairs().map(|(x, y)| x * y).sum();
            let norm_noise = summation_noise(pairs().map(|(x, _)| x * x)) / norm_a
                + summation_noise(pairs().map(|(_, y)| y * y)) / norm_b;
            summation_noise(pairs().map(|(x, y)| x * y)) / denominator
                + (dot / denominator).abs() * 0.5 * norm_noise
        }
    };
    noise as f32
}

/// Verification policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyMode {
    /// Stop at the first out-of-tolerance pair.
    FailFast,
    /// Process the whole corpus and aggregate statistics.
    #[default]
    FullScan,
}

impl fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FailFast => "fail-fast",
            Self::FullScan => "full-scan",
        })
    }
}

impl FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(Self::FailFast),
            "full-scan" | "fullscan" | "full" => Ok(Self::FullScan),
            other => Err(format!(
                "unknown verify mode '{other}' (expected fail-fast or full-scan)"
            )),
        }
    }
}

/// Acceptance limits for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Largest accepted relative difference, in percent.
    pub max_percent: f32,
    /// Smallest absolute floor; no relative difference is recorded for
    /// reference magnitudes at or below it.
    #[serde(default = "default_zero_threshold")]
    pub zero_threshold: f32,
    /// Multiple of the pair's [`rounding_noise`] accepted as absolute floor.
    /// Zero leaves `zero_threshold` as the only floor.
    #[serde(default = "default_noise_factor")]
    pub noise_factor: f32,
}

fn default_zero_threshold() -> f32 {
    DEFAULT_ZERO_THRESHOLD
}

fn default_noise_factor() -> f32 {
    DEFAULT_NOISE_FACTOR
}

impl Tolerance {
    /// Relative limit with the default zero threshold and noise factor.
    #[must_use]
    pub fn percent(max_percent: f32) -> Self {
        Self {
            max_percent,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            noise_factor: DEFAULT_NOISE_FACTOR,
        }
    }

    /// Absolute difference always accepted for a pair with rounding `noise`.
    #[must_use]
    pub fn absolute_floor(&self, noise: f32) -> f32 {
        self.zero_threshold.max(self.noise_factor * noise)
    }

    /// Difference between `candidate` and the ground-truth `reference`,
    /// given the pair's estimated rounding `noise`.
    #[must_use]
    pub fn divergence(&self, candidate: f32, reference: f32, noise: f32) -> Divergence {
        let floor = self.absolute_floor(noise);
        let absolute = (candidate - reference).abs();
        if !absolute.is_finite() {
            return Divergence {
                absolute: f32::INFINITY,
                relative_percent: f32::INFINITY,
                absolute_only: false,
                floor,
            };
        }

        let magnitude = reference.abs();
        let relative_percent = if magnitude <= self.zero_threshold {
            0.0
        } else {
            absolute / magnitude * 100.0
        };
        Divergence {
            absolute,
            relative_percent,
            absolute_only: magnitude <= self.zero_threshold
                || magnitude * self.max_percent / 100.0 <= floor,
            floor,
        }
    }

    /// Whether `divergence` is within this tolerance.
    #[must_use]
    pub fn accepts(&self, divergence: &Divergence) -> bool {
        if divergence.absolute_only {
            divergence.absolute <= divergence.floor
        } else {
            divergence.relative_percent <= self.max_percent
        }
    }
}

/// Divergence between one candidate/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Divergence {
    /// `|candidate - reference|`, or infinity if either side is non-finite.
    pub absolute: f32,
    /// Relative difference in percent; 0 when the reference is within
    /// `zero_threshold` of zero.
    pub relative_percent: f32,
    /// The relative allowance was below `floor`, so the pair is judged on
    /// `absolute <= floor`.
    pub absolute_only: bool,
    /// Absolute floor for this pair.
    pub floor: f32,
}

/// One out-of-tolerance pair, with full context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Metric being verified.
    pub metric: Metric,
    /// Corpus index of the row.
    pub index: usize,
    /// Candidate kernel result.
    pub candidate: f32,
    /// Reference kernel result.
    pub reference: f32,
    /// Measured divergence.
    pub divergence: Divergence,
    /// Limits that were exceeded.
    pub tolerance: Tolerance,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mismatch at vector {}: candidate={}, reference={}, diff={:.9} ({:.6}%), max allowed {:.6}%",
            self.metric,
            self.index,
            self.candidate,
            self.reference,
            self.divergence.absolute,
            self.divergence.relative_percent,
            self.tolerance.max_percent
        )?;
        if self.divergence.absolute_only {
            write!(
                f,
                " (reference within rounding noise, absolute rule applied: allowed diff {:.9})",
                self.divergence.floor
            )?;
        }
        Ok(())
    }
}

/// Outcome of one verification pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    /// Metric verified.
    pub metric: Metric,
    /// Mode the pass ran in.
    pub mode: VerifyMode,
    /// Candidate kernel name.
    pub candidate: &'static str,
    /// Reference kernel name.
    pub reference: &'static str,
    /// Limits applied.
    pub tolerance: Tolerance,
    /// Rows evaluated.
    pub checked: usize,
    /// Rows where both kernels returned non-finite results.
    pub degenerate: usize,
    /// Finite rows judged on the absolute floor instead of `max_percent`.
    pub absolute_rule: usize,
    /// True when no violation was found.
    pub passed: bool,
    /// Every out-of-tolerance row, in index order.
    pub violations: Vec<Violation>,
    /// Absolute-difference distribution over finite pairs.
    pub absolute: Option<Distribution>,
    /// Relative-difference (percent) distribution over finite pairs.
    pub relative: Option<Distribution>,
}

/// Runs candidate and reference kernels over a corpus and compares them.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    mode: VerifyMode,
    tolerance: Tolerance,
}

impl Verifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new(mode: VerifyMode, tolerance: Tolerance) -> Self {
        Self { mode, tolerance }
    }

    /// Verifies `metric` over every `(row, query)` pair.
    ///
    /// In `FailFast` mode the first violation is returned as
    /// [`Error::ToleranceViolation`] and a pair where both kernels are
    /// non-finite as [`Error::DegenerateInput`]. In `FullScan` mode both are
    /// recorded and the pass always completes.
    pub fn verify(
        &self,
        corpus: &Corpus,
        query: &[f32],
        metric: Metric,
        candidate: &dyn MetricKernel,
        reference: &dyn MetricKernel,
    ) -> Result<Verification> {
        if query.len() != corpus.dimension() {
            return Err(Error::DimensionMismatch {
                expected: corpus.dimension(),
                actual: query.len(),
            });
        }

        let mut absolute_diffs = Vec::with_capacity(corpus.len());
        let mut relative_diffs = Vec::with_capacity(corpus.len());
        let mut violations = Vec::new();
        let mut degenerate = 0;
        let mut absolute_rule = 0;

        for (index, row) in corpus.rows().enumerate() {
            let candidate_value = candidate.compute(metric, row, query);
            let reference_value = reference.compute(metric, row, query);

            if !candidate_value.is_finite() && !reference_value.is_finite() {
                if self.mode == VerifyMode::FailFast {
                    return Err(Error::DegenerateInput { metric, index });
                }
                warn!(%metric, index, "both kernels returned a non-finite result");
                degenerate += 1;
                continue;
            }

            let noise = rounding_noise(metric, row, query);
            let divergence = self
                .tolerance
                .divergence(candidate_value, reference_value, noise);
            absolute_diffs.push(divergence.absolute);
            relative_diffs.push(divergence.relative_percent);
            if divergence.absolute_only {
                absolute_rule += 1;
            }

            if !self.tolerance.accepts(&divergence) {
                let violation = Violation {
                    metric,
                    index,
                    candidate: candidate_value,
                    reference: reference_value,
                    divergence,
                    tolerance: self.tolerance,
                };
                if self.mode == VerifyMode::FailFast {
                    return Err(Error::ToleranceViolation(Box::new(violation)));
                }
                warn!("{violation}");
                violations.push(violation);
            }
        }

        let verification = Verification {
            metric,
            mode: self.mode,
            candidate: candidate.name(),
            reference: reference.name(),
            tolerance: self.tolerance,
            checked: corpus.len(),
            degenerate,
            absolute_rule,
            passed: violations.is_empty(),
            violations,
            absolute: Distribution::from_samples(&mut absolute_diffs),
            relative: Distribution::from_samples(&mut relative_diffs),
        };

        info!(
            %metric,
            candidate = verification.candidate,
            checked = verification.checked,
            violations = verification.violations.len(),
            degenerate,
            absolute_rule,
            passed = verification.passed,
            "verification finished"
        );

        Ok(verification)
    }
}
