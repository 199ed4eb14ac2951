//! ARM NEON kernel implementations for aarch64.
//!
//! Four 4-lane accumulators per metric term with fused multiply-add:
//! 16-element blocks feed all four, 4-element blocks feed the first, the
//! registers are combined as `(acc0 + acc1) + (acc2 + acc3)`, reduced with
//! `vaddvq_f32`, and the scalar tail (`len % 4`) is added last.
//!
//! NEON is always available on aarch64, so no runtime detection is needed.

#![allow(clippy::similar_names)]

use std::arch::aarch64::*;

use super::MetricKernel;

/// Loads four lanes from `ptr + offset`.
///
/// # Safety
///
/// `ptr.add(offset)..ptr.add(offset + 4)` must be in bounds.
#[inline]
unsafe fn load4(ptr: *const f32, offset: usize) -> float32x4_t {
    vld1q_f32(ptr.add(offset))
}

/// Combines four accumulators pairwise and reduces them to a scalar.
#[inline]
fn reduce4(acc: [float32x4_t; 4]) -> f32 {
    // SAFETY: NEON arithmetic on registers is always safe on aarch64.
    unsafe {
        let sum01 = vaddq_f32(acc[0], acc[1]);
        let sum23 = vaddq_f32(acc[2], acc[3]);
        vaddvq_f32(vaddq_f32(sum01, sum23))
    }
}

#[inline]
fn squared_l2_neon(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();
    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let mut acc = unsafe { [vdupq_n_f32(0.0); 4] };
    let mut i = 0;

    while i + 16 <= len {
        for (r, sum) in acc.iter_mut().enumerate() {
            // SAFETY: i + 16 <= len, so every 4-lane load at i + 4r is in bounds.
            unsafe {
                let diff = vsubq_f32(load4(a_ptr, i + r * 4), load4(b_ptr, i + r * 4));
                *sum = vfmaq_f32(*sum, diff, diff);
            }
        }
        i += 16;
    }

    while i + 4 <= len {
        // SAFETY: i + 4 <= len.
        unsafe {
            let diff = vsubq_f32(load4(a_ptr, i), load4(b_ptr, i));
            acc[0] = vfmaq_f32(acc[0], diff, diff);
        }
        i += 4;
    }

    let neon_sum = reduce4(acc);

    let mut remaining_sum = 0.0_f32;
    for j in i..len {
        let diff = a[j] - b[j];
        remaining_sum += diff * diff;
    }

    neon_sum + remaining_sum
}

#[inline]
fn inner_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();
    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let mut acc = unsafe { [vdupq_n_f32(0.0); 4] };
    let mut i = 0;

    while i + 16 <= len {
        for (r, sum) in acc.iter_mut().enumerate() {
            // SAFETY: i + 16 <= len, so every 4-lane load at i + 4r is in bounds.
            unsafe {
                *sum = vfmaq_f32(*sum, load4(a_ptr, i + r * 4), load4(b_ptr, i + r * 4));
            }
        }
        i += 16;
    }

    while i + 4 <= len {
        // SAFETY: i + 4 <= len.
        unsafe {
            acc[0] = vfmaq_f32(acc[0], load4(a_ptr, i), load4(b_ptr, i));
        }
        i += 4;
    }

    let neon_sum = reduce4(acc);

    let mut remaining_sum = 0.0_f32;
    for j in i..len {
        remaining_sum += a[j] * b[j];
    }

    neon_sum + remaining_sum
}

#[inline]
fn cosine_neon(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();
    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let zero = unsafe { vdupq_n_f32(0.0) };
    let mut dot = [zero; 4];
    let mut na = [zero; 4];
    let mut nb = [zero; 4];
    let mut i = 0;

    while i + 16 <= len {
        for r in 0..4 {
            // SAFETY: i + 16 <= len, so every 4-lane load at i + 4r is in bounds.
            unsafe {
                let va = load4(a_ptr, i + r * 4);
                let vb = load4(b_ptr, i + r * 4);
                dot[r] = vfmaq_f32(dot[r], va, vb);
                na[r] = vfmaq_f32(na[r], va, va);
                nb[r] = vfmaq_f32(nb[r], vb, vb);
            }
        }
        i += 16;
    }

    while i + 4 <= len {
        // SAFETY: i + 4 <= len.
        unsafe {
            let va = load4(a_ptr, i);
            let vb = load4(b_ptr, i);
            dot[0] = vfmaq_f32(dot[0], va, vb);
            na[0] = vfmaq_f32(na[0], va, va);
            nb[0] = vfmaq_f32(nb[0], vb, vb);
        }
        i += 4;
    }

    let (mut tail_dot, mut tail_a, mut tail_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for j in i..len {
        let x = a[j];
        let y = b[j];
        tail_dot += x * y;
        tail_a += x * x;
        tail_b += y * y;
    }

    let dot = reduce4(dot) + tail_dot;
    let norm_a = reduce4(na) + tail_a;
    let norm_b = reduce4(nb) + tail_b;

    dot / (norm_a * norm_b).sqrt()
}

/// ARM NEON kernel with fused multiply-add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeonKernel;

impl MetricKernel for NeonKernel {
    fn name(&self) -> &'static str {
        "neon-fma"
    }

    fn squared_l2(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        squared_l2_neon(a, b)
    }

    fn inner_product(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        inner_product_neon(a, b)
    }

    fn cosine(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        cosine_neon(a, b)
    }
}
