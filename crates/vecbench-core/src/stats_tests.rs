//! Tests for `stats` module

use super::stats::*;

#[test]
fn test_percentile_index_ten_thousand() {
    assert_eq!(percentile_index(10_000, 95.0), 9499);
    assert_eq!(percentile_index(10_000, 99.0), 9899);
}

#[test]
fn test_percentile_index_small_sequences() {
    assert_eq!(percentile_index(1, 95.0), 0);
    assert_eq!(percentile_index(1, 99.0), 0);
    assert_eq!(percentile_index(2, 95.0), 0);
    assert_eq!(percentile_index(21, 95.0), 19);
    assert_eq!(percentile_index(101, 99.0), 99);
}

#[test]
fn test_percentile_index_bounds() {
    assert_eq!(percentile_index(0, 95.0), 0);
    assert_eq!(percentile_index(10, 0.0), 0);
    assert_eq!(percentile_index(10, 100.0), 9);
    assert_eq!(percentile_index(10, 150.0), 9);
}

#[test]
fn test_distribution_empty_is_none() {
    assert!(Distribution::from_samples(&mut []).is_none());
}

#[test]
fn test_distribution_known_values() {
    let mut samples: Vec<f32> = (1..=100).rev().map(|i| i as f32).collect();
    let d = Distribution::from_samples(&mut samples).expect("non-empty");

    assert_eq!(d.min, 1.0);
    assert_eq!(d.max, 100.0);
    assert!((d.mean - 50.5).abs() < 1e-6);
    // floor(99 * 0.95) = 94 -> value 95
    assert_eq!(d.p95, 95.0);
    // floor(99 * 0.99) = 98 -> value 99
    assert_eq!(d.p99, 99.0);
}

#[test]
fn test_distribution_sorts_in_place() {
    let mut samples = vec![3.0, 1.0, 2.0];
    let d = Distribution::from_samples(&mut samples).expect("non-empty");
    assert_eq!(samples, vec![1.0, 2.0, 3.0]);
    assert_eq!(d.min, 1.0);
    assert_eq!(d.max, 3.0);
    assert_eq!(d.p95, 2.0);
}

#[test]
fn test_distribution_single_sample() {
    let d = Distribution::from_samples(&mut [0.25]).expect("non-empty");
    assert_eq!(d.min, 0.25);
    assert_eq!(d.mean, 0.25);
    assert_eq!(d.p95, 0.25);
    assert_eq!(d.p99, 0.25);
    assert_eq!(d.max, 0.25);
}

#[test]
fn test_distribution_mean_accumulates_in_f64() {
    // 1e8 + many small values: an f32 running sum would drop the small terms.
    let mut samples = vec![1.0_f32; 1000];
    samples.push(1.0e8);
    let d = Distribution::from_samples(&mut samples).expect("non-empty");
    let expected = (1.0e8_f64 + 1000.0) / 1001.0;
    assert!((f64::from(d.mean) - expected).abs() / expected < 1e-6);
}

#[test]
fn test_distribution_infinite_sample_is_max() {
    let mut samples = vec![0.1, f32::INFINITY, 0.2];
    let d = Distribution::from_samples(&mut samples).expect("non-empty");
    assert_eq!(d.max, f32::INFINITY);
    assert_eq!(d.min, 0.1);
}
