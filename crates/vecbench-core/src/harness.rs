//! Wall-clock timing of kernels over a full corpus.
//!
//! A measurement is a short warm-up over a corpus prefix followed by the
//! timed `iterations × corpus.len()` loop. Results are summed into a
//! checksum that goes through `black_box` so the kernel calls cannot be
//! eliminated. Comparisons run the reference to completion before the
//! candidate starts; variants are never interleaved.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::simd_native::{Metric, MetricKernel};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// `std::time::Instant`-backed clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// One kernel's timed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timing {
    /// Kernel name.
    pub kernel: &'static str,
    /// Metric timed.
    pub metric: Metric,
    /// Passes over the corpus.
    pub iterations: usize,
    /// Kernel calls in the timed loop (`iterations × corpus size`).
    pub invocations: u64,
    /// Wall-clock time of the timed loop.
    pub elapsed: Duration,
    /// Sum of every result; compare across kernels as a smoke check.
    pub checksum: f64,
}

impl Timing {
    /// Mean time per kernel call.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_per_call(&self) -> Duration {
        if self.invocations == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.elapsed.as_secs_f64() / self.invocations as f64)
    }
}

/// Reference and candidate timings over the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Scalar (baseline) run.
    pub reference: Timing,
    /// SIMD run.
    pub candidate: Timing,
    /// `elapsed(reference) / elapsed(candidate)`.
    pub speedup: f64,
    /// `|checksum(candidate) - checksum(reference)|`.
    pub checksum_abs_diff: f64,
    /// Checksum difference relative to the reference checksum, in percent.
    pub checksum_percent_diff: f64,
}

/// Runs timed kernel loops.
pub struct TimingHarness {
    iterations: usize,
    warmup_rounds: usize,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for TimingHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingHarness")
            .field("iterations", &self.iterations)
            .field("warmup_rounds", &self.warmup_rounds)
            .finish_non_exhaustive()
    }
}

impl TimingHarness {
    /// Creates a harness using the monotonic system clock.
    #[must_use]
    pub fn new(iterations: usize, warmup_rounds: usize) -> Self {
        Self {
            iterations,
            warmup_rounds,
            clock: Box::new(MonotonicClock::new()),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Passes over the corpus per measurement.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Times `kernel` computing `metric` for every row against `query`.
    pub fn measure(
        &self,
        corpus: &Corpus,
        query: &[f32],
        metric: Metric,
        kernel: &dyn MetricKernel,
    ) -> Result<Timing> {
        if query.len() != corpus.dimension() {
            return Err(Error::DimensionMismatch {
                expected: corpus.dimension(),
                actual: query.len(),
            });
        }

        if !corpus.is_empty() {
            for i in 0..self.warmup_rounds {
                let row = corpus.row(i % corpus.len());
                std::hint::black_box(kernel.compute(metric, row, query));
            }
        }

        let mut checksum = 0.0_f64;
        let start = self.clock.now();
        for _ in 0..self.iterations {
            for row in corpus.rows() {
                checksum += f64::from(kernel.compute(
                    metric,
                    std::hint::black_box(row),
                    std::hint::black_box(query),
                ));
            }
        }
        let elapsed = self.clock.now().saturating_sub(start);
        let checksum = std::hint::black_box(checksum);

        let timing = Timing {
            kernel: kernel.name(),
            metric,
            iterations: self.iterations,
            invocations: (self.iterations as u64).saturating_mul(corpus.len() as u64),
            elapsed,
            checksum,
        };

        debug!(
            kernel = timing.kernel,
            %metric,
            elapsed_ms = timing.elapsed.as_secs_f64() * 1e3,
            avg_ns = timing.average_per_call().as_secs_f64() * 1e9,
            "timed loop finished"
        );

        Ok(timing)
    }

    /// Times `reference`, then `candidate`, and derives the speedup.
    pub fn compare(
        &self,
        corpus: &Corpus,
        query: &[f32],
        metric: Metric,
        reference: &dyn MetricKernel,
        candidate: &dyn MetricKernel,
    ) -> Result<Comparison> {
        let reference = self.measure(corpus, query, metric, reference)?;
        let candidate = self.measure(corpus, query, metric, candidate)?;

        let speedup = speedup(reference.elapsed, candidate.elapsed);
        let checksum_abs_diff = (candidate.checksum - reference.checksum).abs();
        let checksum_percent_diff = if reference.checksum.abs() > 0.0 {
            checksum_abs_diff / reference.checksum.abs() * 100.0
        } else {
            0.0
        };

        Ok(Comparison {
            reference,
            candidate,
            speedup,
            checksum_abs_diff,
            checksum_percent_diff,
        })
    }
}

/// `reference / candidate`; infinite when the candidate took no measurable time.
#[must_use]
pub fn speedup(reference: Duration, candidate: Duration) -> f64 {
    if candidate.is_zero() {
        return if reference.is_zero() { 1.0 } else { f64::INFINITY };
    }
    reference.as_secs_f64() / candidate.as_secs_f64()
}
