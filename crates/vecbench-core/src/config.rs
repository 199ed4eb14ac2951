//! Benchmark configuration.
//!
//! Values are layered with `figment`, later sources winning:
//! 1. built-in defaults ([`BenchConfig::default`]),
//! 2. an optional TOML file,
//! 3. `VECBENCH_*` environment variables (`__` separates nested keys, e.g.
//!    `VECBENCH_TOLERANCE__COSINE=0.001`),
//! 4. whatever the caller merges on top (the CLI merges its flags).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::simd_native::{Accumulation, CandidateKernel, Metric};
use crate::verify::{Tolerance, VerifyMode, DEFAULT_NOISE_FACTOR, DEFAULT_ZERO_THRESHOLD};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VECBENCH_";

/// Common embedding width.
pub const DEFAULT_DIMENSION: usize = 1536;
/// Default number of corpus vectors.
pub const DEFAULT_CORPUS_SIZE: usize = 10_000;
/// Default timed passes over the corpus.
pub const DEFAULT_ITERATIONS: usize = 1000;
/// Default untimed warm-up calls.
pub const DEFAULT_WARMUP_ROUNDS: usize = 10;

/// Full configuration of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Vector dimension D.
    pub dimension: usize,
    /// Number of corpus vectors N.
    pub corpus_size: usize,
    /// Timed passes over the corpus I.
    pub iterations: usize,
    /// Untimed kernel calls before each timed loop.
    pub warmup_rounds: usize,
    /// RNG seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Verification policy.
    pub mode: VerifyMode,
    /// Metrics to verify and time, in order.
    pub metrics: Vec<Metric>,
    /// Candidate kernel selection.
    pub kernel: KernelConfig,
    /// Per-metric tolerances.
    pub tolerance: ToleranceConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            corpus_size: DEFAULT_CORPUS_SIZE,
            iterations: DEFAULT_ITERATIONS,
            warmup_rounds: DEFAULT_WARMUP_ROUNDS,
            seed: None,
            mode: VerifyMode::default(),
            metrics: Metric::ALL.to_vec(),
            kernel: KernelConfig::default(),
            tolerance: ToleranceConfig::default(),
        }
    }
}

/// Which SIMD kernel is measured against the scalar reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Candidate kernel.
    pub candidate: CandidateKernel,
    /// Accumulation strategy for portable kernels.
    pub accumulation: Accumulation,
}

/// Relative tolerances in percent, one per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Squared L2 limit (%).
    pub squared_l2: f32,
    /// Inner product limit (%).
    pub inner_product: f32,
    /// Cosine limit (%).
    pub cosine: f32,
    /// Smallest absolute floor for any pair.
    pub zero_threshold: f32,
    /// Multiple of a pair's estimated rounding noise accepted as absolute
    /// floor; 0 disables the noise floor.
    pub noise_factor: f32,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            squared_l2: 0.000_25,
            inner_product: 0.000_5,
            cosine: 0.000_5,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            noise_factor: DEFAULT_NOISE_FACTOR,
        }
    }
}

impl ToleranceConfig {
    /// Tolerance applied to `metric`.
    #[must_use]
    pub fn for_metric(&self, metric: Metric) -> Tolerance {
        let max_percent = match metric {
            Metric::SquaredL2 => self.squared_l2,
            Metric::InnerProduct => self.inner_product,
            Metric::Cosine => self.cosine,
        };
        Tolerance {
            max_percent,
            zero_threshold: self.zero_threshold,
            noise_factor: self.noise_factor,
        }
    }
}

impl BenchConfig {
    /// Defaults, then `path` (if given), then the environment.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(Error::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates a configuration from `figment`.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults, the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be > 0".to_string()));
        }
        if self.corpus_size == 0 {
            return Err(Error::InvalidConfig("corpus_size must be > 0".to_string()));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be > 0".to_string()));
        }
        if self.metrics.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one metric is required".to_string(),
            ));
        }
        let t = &self.tolerance;
        for (name, value) in [
            ("tolerance.squared_l2", t.squared_l2),
            ("tolerance.inner_product", t.inner_product),
            ("tolerance.cosine", t.cosine),
            ("tolerance.zero_threshold", t.zero_threshold),
            ("tolerance.noise_factor", t.noise_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
