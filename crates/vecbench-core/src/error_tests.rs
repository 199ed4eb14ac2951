//! Tests for `error` module

use super::error::*;
use super::simd_native::Metric;
use super::verify::{Divergence, Tolerance, Violation};

fn violation() -> Violation {
    Violation {
        metric: Metric::Cosine,
        index: 42,
        candidate: 0.5,
        reference: 0.25,
        divergence: Divergence {
            absolute: 0.25,
            relative_percent: 100.0,
            absolute_only: false,
            floor: 1.0e-6,
        },
        tolerance: Tolerance::percent(0.0005),
    }
}

#[test]
fn test_error_display() {
    let err = Error::Allocation { elements: 1024 };
    assert_eq!(
        err.to_string(),
        "Memory allocation failed for 1024 f32 elements"
    );

    let err = Error::DimensionMismatch {
        expected: 768,
        actual: 512,
    };
    assert_eq!(err.to_string(), "Dimension mismatch: expected 768, got 512");

    let err = Error::DegenerateInput {
        metric: Metric::Cosine,
        index: 3,
    };
    assert!(err.to_string().contains("cosine at vector 3"));

    let err = Error::UnsupportedKernel("avx2".to_string());
    assert_eq!(err.to_string(), "Unsupported kernel: avx2");

    let err = Error::InvalidConfig("dimension must be > 0".to_string());
    assert_eq!(
        err.to_string(),
        "Invalid configuration: dimension must be > 0"
    );
}

#[test]
fn test_tolerance_violation_display_is_violation() {
    let v = violation();
    let err = Error::ToleranceViolation(Box::new(v.clone()));
    assert_eq!(err.to_string(), v.to_string());
    assert!(err.to_string().starts_with("cosine mismatch at vector 42"));
}

#[test]
fn test_exit_codes() {
    assert_eq!(Error::ToleranceViolation(Box::new(violation())).exit_code(), 1);
    assert_eq!(
        Error::DegenerateInput {
            metric: Metric::SquaredL2,
            index: 0
        }
        .exit_code(),
        1
    );
    assert_eq!(Error::Allocation { elements: 1 }.exit_code(), 3);
    assert_eq!(Error::InvalidConfig(String::new()).exit_code(), 2);
    assert_eq!(Error::UnsupportedKernel(String::new()).exit_code(), 2);
    assert_eq!(Error::Serialization(String::new()).exit_code(), 2);
    assert_eq!(
        Error::DimensionMismatch {
            expected: 1,
            actual: 2
        }
        .exit_code(),
        2
    );
}

#[test]
fn test_figment_error_converts() {
    let err: Error = figment::Error::from("bad value".to_string()).into();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().starts_with("Configuration error"));
}
