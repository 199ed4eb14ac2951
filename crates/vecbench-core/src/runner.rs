//! Orchestrates a full run: generate, verify, then time each metric.

use tracing::info;

use crate::config::BenchConfig;
use crate::corpus::{CorpusGenerator, Dataset};
use crate::error::Result;
use crate::harness::{Clock, TimingHarness};
use crate::report::{BenchReport, MetricReport};
use crate::simd_native::{select_kernel, simd_level, MetricKernel, ScalarKernel};
use crate::verify::Verifier;

/// Drives verification and timing for every configured metric.
#[derive(Debug)]
pub struct BenchRunner {
    config: BenchConfig,
    harness: TimingHarness,
}

impl BenchRunner {
    /// Validates `config` and prepares a harness on the system clock.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let harness = TimingHarness::new(config.iterations, config.warmup_rounds);
        Ok(Self { config, harness })
    }

    /// Replaces the harness time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.harness = self.harness.with_clock(clock);
        self
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Generates the dataset and runs the configured candidate against the
    /// scalar reference.
    pub fn run(&self) -> Result<BenchReport> {
        let candidate = select_kernel(
            self.config.kernel.candidate,
            self.config.kernel.accumulation,
        )?;
        let generator = CorpusGenerator::new(
            self.config.dimension,
            self.config.corpus_size,
            self.config.seed,
        );
        info!(
            dimension = self.config.dimension,
            corpus_size = self.config.corpus_size,
            seed = generator.seed(),
            "generating corpus"
        );
        let dataset = generator.generate()?;

        let mut report = self.run_on(&dataset, candidate.as_ref(), &ScalarKernel)?;
        report.seed = Some(generator.seed());
        Ok(report)
    }

    /// Runs `candidate` against `reference` on a caller-supplied dataset.
    ///
    /// Metrics are processed in configuration order. For each one the full
    /// verification pass completes before timing starts.
    pub fn run_on(
        &self,
        dataset: &Dataset,
        candidate: &dyn MetricKernel,
        reference: &dyn MetricKernel,
    ) -> Result<BenchReport> {
        info!(
            candidate = candidate.name(),
            reference = reference.name(),
            simd_level = %simd_level(),
            mode = %self.config.mode,
            "starting benchmark"
        );

        let mut metrics = Vec::with_capacity(self.config.metrics.len());
        for &metric in &self.config.metrics {
            let verifier =
                Verifier::new(self.config.mode, self.config.tolerance.for_metric(metric));
            let verification =
                verifier.verify(&dataset.corpus, &dataset.query, metric, candidate, reference)?;

            let timing = self.harness.compare(
                &dataset.corpus,
                &dataset.query,
                metric,
                reference,
                candidate,
            )?;
            info!(
                %metric,
                speedup = timing.speedup,
                passed = verification.passed,
                "metric complete"
            );

            metrics.push(MetricReport {
                metric,
                verification,
                timing,
            });
        }

        Ok(BenchReport {
            config: self.config.clone(),
            seed: None,
            simd_level: simd_level(),
            candidate: candidate.name(),
            reference: reference.name(),
            preview: dataset.preview(),
            metrics,
        })
    }
}
