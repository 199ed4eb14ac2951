#![allow(clippy::cast_precision_loss)]
//! Tests for SIMD level detection and kernel selection.

use super::{
    has_hardware_fma, select_kernel, simd_level, Accumulation, CandidateKernel, Metric,
    MetricKernel, ScalarKernel, SimdLevel,
};
use crate::error::Error;

fn generate_vector(dim: usize, seed: f32) -> Vec<f32> {
    (0..dim).map(|i| (seed + i as f32 * 0.1).sin()).collect()
}

#[test]
fn test_simd_level_is_cached_and_stable() {
    let first = simd_level();
    for _ in 0..10 {
        assert_eq!(simd_level(), first);
    }
}

#[test]
fn test_simd_level_matches_architecture() {
    let level = simd_level();
    #[cfg(target_arch = "aarch64")]
    assert_eq!(level, SimdLevel::Neon);
    #[cfg(target_arch = "x86_64")]
    assert!(matches!(level, SimdLevel::Avx2 | SimdLevel::Scalar));
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    assert_eq!(level, SimdLevel::Scalar);
    if level != SimdLevel::Scalar {
        assert!(has_hardware_fma());
    }
}

#[test]
fn test_auto_kernel_matches_scalar_reference() {
    let kernel = select_kernel(CandidateKernel::Auto, Accumulation::Auto).unwrap();
    let a = generate_vector(1536, 0.0);
    let b = generate_vector(1536, 1.0);
    for metric in Metric::ALL {
        let got = kernel.compute(metric, &a, &b);
        let expected = ScalarKernel.compute(metric, &a, &b);
        let allowed = 1e-4 * expected.abs().max(1.0);
        assert!(
            (got - expected).abs() <= allowed,
            "{} {metric}: {got} vs {expected}",
            kernel.name()
        );
    }
}

#[test]
fn test_auto_kernel_name_follows_level() {
    let kernel = select_kernel(CandidateKernel::Auto, Accumulation::Auto).unwrap();
    match simd_level() {
        SimdLevel::Avx2 => assert_eq!(kernel.name(), "avx2-fma"),
        SimdLevel::Neon => assert_eq!(kernel.name(), "neon-fma"),
        SimdLevel::Scalar => assert!(kernel.name().starts_with("lanes-x16")),
    }
}

#[test]
fn test_portable_kernels_always_available() {
    let x4 = select_kernel(CandidateKernel::Lanes4, Accumulation::Fused).unwrap();
    assert_eq!(x4.name(), "lanes-x4-fma");
    let x16 = select_kernel(CandidateKernel::Lanes16, Accumulation::Pairwise).unwrap();
    assert_eq!(x16.name(), "lanes-x16-pairwise");
}

#[test]
fn test_explicit_isa_request_respects_hardware() {
    let avx2 = select_kernel(CandidateKernel::Avx2, Accumulation::Auto);
    if simd_level() == SimdLevel::Avx2 {
        assert_eq!(avx2.unwrap().name(), "avx2-fma");
    } else {
        assert!(matches!(avx2, Err(Error::UnsupportedKernel(_))));
    }

    let neon = select_kernel(CandidateKernel::Neon, Accumulation::Auto);
    if cfg!(target_arch = "aarch64") {
        assert_eq!(neon.unwrap().name(), "neon-fma");
    } else {
        assert!(matches!(neon, Err(Error::UnsupportedKernel(_))));
    }
}

#[test]
fn test_kernel_enums_parse_their_display() {
    for candidate in [
        CandidateKernel::Auto,
        CandidateKernel::Lanes4,
        CandidateKernel::Lanes16,
        CandidateKernel::Avx2,
        CandidateKernel::Neon,
    ] {
        assert_eq!(candidate.to_string().parse::<CandidateKernel>(), Ok(candidate));
    }
    for accumulation in [Accumulation::Auto, Accumulation::Fused, Accumulation::Pairwise] {
        assert_eq!(accumulation.to_string().parse::<Accumulation>(), Ok(accumulation));
    }
    assert!("avx512".parse::<CandidateKernel>().is_err());
    assert!("kahan".parse::<Accumulation>().is_err());
}

#[cfg(target_arch = "x86_64")]
#[test]
fn test_avx2_remainder_dimensions() {
    let Some(kernel) = super::Avx2Kernel::detect() else {
        return;
    };
    for dim in [1_usize, 7, 8, 9, 13, 15, 16, 17, 23, 24, 25, 1531] {
        let a = generate_vector(dim, 0.3);
        let b = generate_vector(dim, 2.0);
        for metric in Metric::ALL {
            let got = kernel.compute(metric, &a, &b);
            let expected = ScalarKernel.compute(metric, &a, &b);
            assert!(
                (got - expected).abs() <= 1e-4 * expected.abs().max(1.0),
                "avx2 {metric} dim={dim}: {got} vs {expected}"
            );
        }
    }
}

#[cfg(target_arch = "aarch64")]
#[test]
fn test_neon_remainder_dimensions() {
    let kernel = super::NeonKernel;
    for dim in [1_usize, 3, 4, 5, 13, 15, 16, 17, 1531] {
        let a = generate_vector(dim, 0.3);
        let b = generate_vector(dim, 2.0);
        for metric in Metric::ALL {
            let got = kernel.compute(metric, &a, &b);
            let expected = ScalarKernel.compute(metric, &a, &b);
            assert!(
                (got - expected).abs() <= 1e-4 * expected.abs().max(1.0),
                "neon {metric} dim={dim}: {got} vs {expected}"
            );
        }
    }
}
