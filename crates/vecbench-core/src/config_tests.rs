//! Tests for `config` module

use std::io::Write;

use figment::providers::Serialized;
use serial_test::serial;

use super::config::*;
use super::error::Error;
use super::simd_native::{Accumulation, CandidateKernel, Metric};
use super::verify::{VerifyMode, DEFAULT_NOISE_FACTOR, DEFAULT_ZERO_THRESHOLD};

/// Removes the listed variables on drop so a failing test cannot leak them.
struct EnvGuard(&'static [&'static str]);

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in self.0 {
            std::env::remove_var(key);
        }
    }
}

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

// =========================================================================
// Defaults
// =========================================================================

#[test]
fn test_defaults() {
    let config = BenchConfig::default();
    assert_eq!(config.dimension, DEFAULT_DIMENSION);
    assert_eq!(config.corpus_size, DEFAULT_CORPUS_SIZE);
    assert_eq!(config.iterations, DEFAULT_ITERATIONS);
    assert_eq!(config.warmup_rounds, DEFAULT_WARMUP_ROUNDS);
    assert_eq!(config.seed, None);
    assert_eq!(config.mode, VerifyMode::FullScan);
    assert_eq!(config.metrics, Metric::ALL.to_vec());
    assert_eq!(config.kernel.candidate, CandidateKernel::Auto);
    assert_eq!(config.kernel.accumulation, Accumulation::Auto);
    assert!(config.validate().is_ok());
}

#[test]
fn test_tolerance_for_metric() {
    let t = ToleranceConfig::default();
    assert_eq!(t.for_metric(Metric::SquaredL2).max_percent, 0.000_25);
    assert_eq!(t.for_metric(Metric::InnerProduct).max_percent, 0.000_5);
    assert_eq!(t.for_metric(Metric::Cosine).max_percent, 0.000_5);
    assert_eq!(
        t.for_metric(Metric::Cosine).zero_threshold,
        DEFAULT_ZERO_THRESHOLD
    );
    assert_eq!(
        t.for_metric(Metric::InnerProduct).noise_factor,
        DEFAULT_NOISE_FACTOR
    );
}

#[test]
fn test_validate_rejects_negative_noise_factor() {
    let mut config = BenchConfig::default();
    config.tolerance.noise_factor = -1.0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tolerance.noise_factor"), "{err}");
}

// =========================================================================
// Layering
// =========================================================================

#[test]
#[serial]
fn test_load_without_file_uses_defaults() {
    let config = BenchConfig::load(None).unwrap();
    assert_eq!(config, BenchConfig::default());
}

#[test]
#[serial]
fn test_load_from_toml_file() {
    let file = write_toml(
        r#"
dimension = 64
corpus_size = 10
seed = 1234
mode = "fail-fast"
metrics = ["cosine", "squared-l2"]

[kernel]
candidate = "lanes4"
accumulation = "pairwise"

[tolerance]
cosine = 0.01
"#,
    );

    let config = BenchConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.dimension, 64);
    assert_eq!(config.corpus_size, 10);
    assert_eq!(config.seed, Some(1234));
    assert_eq!(config.mode, VerifyMode::FailFast);
    assert_eq!(config.metrics, vec![Metric::Cosine, Metric::SquaredL2]);
    assert_eq!(config.kernel.candidate, CandidateKernel::Lanes4);
    assert_eq!(config.kernel.accumulation, Accumulation::Pairwise);
    assert_eq!(config.tolerance.cosine, 0.01);
    // Untouched keys keep their defaults.
    assert_eq!(config.iterations, DEFAULT_ITERATIONS);
    assert_eq!(config.tolerance.squared_l2, 0.000_25);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let _guard = EnvGuard(&["VECBENCH_DIMENSION", "VECBENCH_TOLERANCE__COSINE"]);
    let file = write_toml("dimension = 64\n");
    std::env::set_var("VECBENCH_DIMENSION", "32");
    std::env::set_var("VECBENCH_TOLERANCE__COSINE", "0.25");

    let config = BenchConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.dimension, 32);
    assert_eq!(config.tolerance.cosine, 0.25);
}

#[test]
#[serial]
fn test_caller_overrides_win() {
    let _guard = EnvGuard(&["VECBENCH_ITERATIONS"]);
    std::env::set_var("VECBENCH_ITERATIONS", "7");

    let figment = BenchConfig::figment(None)
        .unwrap()
        .merge(Serialized::default("iterations", 3));
    let config = BenchConfig::from_figment(&figment).unwrap();
    assert_eq!(config.iterations, 3);
}

#[test]
#[serial]
fn test_missing_file_is_error() {
    let err = BenchConfig::load(Some(std::path::Path::new("/nonexistent/vecbench.toml")))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(err.to_string().contains("not found"));
}

#[test]
#[serial]
fn test_malformed_value_is_config_error() {
    let file = write_toml("mode = \"sometimes\"\n");
    let err = BenchConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_validate_rejects_zero_sizes() {
    for config in [
        BenchConfig {
            dimension: 0,
            ..BenchConfig::default()
        },
        BenchConfig {
            corpus_size: 0,
            ..BenchConfig::default()
        },
        BenchConfig {
            iterations: 0,
            ..BenchConfig::default()
        },
        BenchConfig {
            metrics: Vec::new(),
            ..BenchConfig::default()
        },
    ] {
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}

#[test]
fn test_validate_rejects_bad_tolerance() {
    let mut config = BenchConfig::default();
    config.tolerance.cosine = -1.0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("tolerance.cosine"));

    config.tolerance.cosine = f32::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_warmup_is_valid() {
    let config = BenchConfig {
        warmup_rounds: 0,
        ..BenchConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_to_toml_lists_fields() {
    let config = BenchConfig {
        seed: Some(5),
        ..BenchConfig::default()
    };
    let text = config.to_toml().unwrap();
    assert!(text.contains("dimension = 1536"), "{text}");
    assert!(text.contains("seed = 5"), "{text}");
    assert!(text.contains("[kernel]"), "{text}");
    assert!(text.contains("[tolerance]"), "{text}");
}
