//! AVX2+FMA kernel implementations for x86_64.
//!
//! Two 8-lane accumulators per metric term: 16-element blocks feed both,
//! an 8-element block feeds the first, the pair is combined and reduced
//! horizontally, and the scalar tail (`len % 8`) is added last.
//!
//! All `unsafe` functions require AVX2+FMA; [`Avx2Kernel`] can only be
//! obtained through [`Avx2Kernel::detect`], which checks both at runtime.

#![allow(clippy::similar_names)]

use std::arch::x86_64::*;

use super::MetricKernel;

/// Horizontal sum of an 8-lane register.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum256(v: __m256) -> f32 {
    let hi = _mm256_extractf128_ps(v, 1);
    let lo = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(lo, hi);
    let shuf = _mm_movehdup_ps(sum128);
    let sums = _mm_add_ps(sum128, shuf);
    let shuf2 = _mm_movehl_ps(sums, sums);
    _mm_cvtss_f32(_mm_add_ss(sums, shuf2))
}

/// AVX2 squared L2 distance.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA
/// - `a.len() == b.len()`
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn squared_l2_avx2(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut sum0 = _mm256_setzero_ps();
    let mut sum1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= len {
        let d0 = _mm256_sub_ps(_mm256_loadu_ps(a_ptr.add(i)), _mm256_loadu_ps(b_ptr.add(i)));
        sum0 = _mm256_fmadd_ps(d0, d0, sum0);
        let d1 = _mm256_sub_ps(
            _mm256_loadu_ps(a_ptr.add(i + 8)),
            _mm256_loadu_ps(b_ptr.add(i + 8)),
        );
        sum1 = _mm256_fmadd_ps(d1, d1, sum1);
        i += 16;
    }

    if i + 8 <= len {
        let d = _mm256_sub_ps(_mm256_loadu_ps(a_ptr.add(i)), _mm256_loadu_ps(b_ptr.add(i)));
        sum0 = _mm256_fmadd_ps(d, d, sum0);
        i += 8;
    }

    let simd_sum = hsum256(_mm256_add_ps(sum0, sum1));

    let mut remaining_sum = 0.0_f32;
    for j in i..len {
        let diff = a[j] - b[j];
        remaining_sum += diff * diff;
    }

    simd_sum + remaining_sum
}

/// AVX2 inner product.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA
/// - `a.len() == b.len()`
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn inner_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut sum0 = _mm256_setzero_ps();
    let mut sum1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= len {
        sum0 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a_ptr.add(i)),
            _mm256_loadu_ps(b_ptr.add(i)),
            sum0,
        );
        sum1 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a_ptr.add(i + 8)),
            _mm256_loadu_ps(b_ptr.add(i + 8)),
            sum1,
        );
        i += 16;
    }

    if i + 8 <= len {
        sum0 = _mm256_fmadd_ps(
            _mm256_loadu_ps(a_ptr.add(i)),
            _mm256_loadu_ps(b_ptr.add(i)),
            sum0,
        );
        i += 8;
    }

    let simd_sum = hsum256(_mm256_add_ps(sum0, sum1));

    let mut remaining_sum = 0.0_f32;
    for j in i..len {
        remaining_sum += a[j] * b[j];
    }

    simd_sum + remaining_sum
}

/// AVX2 fused cosine: dot product and both norms in a single pass.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA
/// - `a.len() == b.len()`
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn cosine_avx2(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut dot0 = _mm256_setzero_ps();
    let mut dot1 = _mm256_setzero_ps();
    let mut na0 = _mm256_setzero_ps();
    let mut na1 = _mm256_setzero_ps();
    let mut nb0 = _mm256_setzero_ps();
    let mut nb1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= len {
        let va0 = _mm256_loadu_ps(a_ptr.add(i));
        let vb0 = _mm256_loadu_ps(b_ptr.add(i));
        dot0 = _mm256_fmadd_ps(va0, vb0, dot0);
        na0 = _mm256_fmadd_ps(va0, va0, na0);
        nb0 = _mm256_fmadd_ps(vb0, vb0, nb0);

        let va1 = _mm256_loadu_ps(a_ptr.add(i + 8));
        let vb1 = _mm256_loadu_ps(b_ptr.add(i + 8));
        dot1 = _mm256_fmadd_ps(va1, vb1, dot1);
        na1 = _mm256_fmadd_ps(va1, va1, na1);
        nb1 = _mm256_fmadd_ps(vb1, vb1, nb1);
        i += 16;
    }

    if i + 8 <= len {
        let va = _mm256_loadu_ps(a_ptr.add(i));
        let vb = _mm256_loadu_ps(b_ptr.add(i));
        dot0 = _mm256_fmadd_ps(va, vb, dot0);
        na0 = _mm256_fmadd_ps(va, va, na0);
        nb0 = _mm256_fmadd_ps(vb, vb, nb0);
        i += 8;
    }

    let mut dot = hsum256(_mm256_add_ps(dot0, dot1));
    let mut norm_a = hsum256(_mm256_add_ps(na0, na1));
    let mut norm_b = hsum256(_mm256_add_ps(nb0, nb1));

    let (mut tail_dot, mut tail_a, mut tail_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for j in i..len {
        let x = a[j];
        let y = b[j];
        tail_dot += x * y;
        tail_a += x * x;
        tail_b += y * y;
    }
    dot += tail_dot;
    norm_a += tail_a;
    norm_b += tail_b;

    dot / (norm_a * norm_b).sqrt()
}

/// AVX2+FMA kernel. Only constructible on CPUs that support both features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx2Kernel {
    _detected: (),
}

impl Avx2Kernel {
    /// Returns the kernel when the running CPU supports AVX2 and FMA.
    #[must_use]
    pub fn detect() -> Option<Self> {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            Some(Self { _detected: () })
        } else {
            None
        }
    }
}

impl MetricKernel for Avx2Kernel {
    fn name(&self) -> &'static str {
        "avx2-fma"
    }

    fn squared_l2(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        // SAFETY: `Avx2Kernel` exists only after runtime AVX2+FMA detection.
        unsafe { squared_l2_avx2(a, b) }
    }

    fn inner_product(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        // SAFETY: `Avx2Kernel` exists only after runtime AVX2+FMA detection.
        unsafe { inner_product_avx2(a, b) }
    }

    fn cosine(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        // SAFETY: `Avx2Kernel` exists only after runtime AVX2+FMA detection.
        unsafe { cosine_avx2(a, b) }
    }
}
