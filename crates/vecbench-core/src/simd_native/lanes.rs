//! Portable lane-parallel kernels.
//!
//! Models a 128-bit SIMD unit in plain Rust: a `Register` holds four `f32`
//! lanes and every operation is applied lane-wise. The kernel can run one
//! register (4 lanes) or four registers (16 lanes) per loop iteration, and
//! either fuse the multiply into the running sum (`mul_add`, one rounding)
//! or, without FMA hardware, add the four register products pairwise before
//! they reach the running sum.
//!
//! The pairwise step exists only in 16-lane blocks. A 4-lane kernel has a
//! single product per step, so without fusion it is a plain multiply then
//! add into register 0, and `lanes-x4` names exactly that.
//!
//! Summation order, for every metric:
//! 1. full-width blocks into per-register running sums,
//! 2. remaining 4-wide blocks into register 0,
//! 3. registers combined as `(r0 + r1) + (r2 + r3)`,
//! 4. lanes reduced as `(l0 + l1) + (l2 + l3)`,
//! 5. scalar tail (`len % 4` elements) summed separately and added last.

#![allow(clippy::inline_always)] // Register ops must inline to stay in SIMD-friendly form.

use serde::{Deserialize, Serialize};

use super::dispatch::{has_hardware_fma, Accumulation};
use super::MetricKernel;

const LANES: usize = 4;
const REGISTERS: usize = 4;

/// Number of lanes consumed per main-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaneWidth {
    /// One 4-lane register.
    X4,
    /// Four 4-lane registers.
    X16,
}

impl LaneWidth {
    /// Lanes per main-loop iteration.
    #[must_use]
    pub fn lanes(self) -> usize {
        match self {
            Self::X4 => LANES,
            Self::X16 => LANES * REGISTERS,
        }
    }
}

/// Four `f32` lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Register([f32; LANES]);

impl Register {
    const ZERO: Self = Self([0.0; LANES]);

    /// Loads the first four elements of `s`.
    #[inline(always)]
    fn load(s: &[f32]) -> Self {
        Self([s[0], s[1], s[2], s[3]])
    }

    #[inline(always)]
    fn zip(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let [a0, a1, a2, a3] = self.0;
        let [b0, b1, b2, b3] = other.0;
        Self([f(a0, b0), f(a1, b1), f(a2, b2), f(a3, b3)])
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self.zip(other, |x, y| x + y)
    }

    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        self.zip(other, |x, y| x - y)
    }

    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        self.zip(other, |x, y| x * y)
    }

    /// `self + u * v` with a single rounding per lane.
    #[inline(always)]
    fn fused(self, u: Self, v: Self) -> Self {
        let [s0, s1, s2, s3] = self.0;
        let [u0, u1, u2, u3] = u.0;
        let [v0, v1, v2, v3] = v.0;
        Self([
            u0.mul_add(v0, s0),
            u1.mul_add(v1, s1),
            u2.mul_add(v2, s2),
            u3.mul_add(v3, s3),
        ])
    }

    /// Pairwise horizontal reduction.
    #[inline(always)]
    fn reduce(self) -> f32 {
        let [l0, l1, l2, l3] = self.0;
        (l0 + l1) + (l2 + l3)
    }
}

/// Running sums for one metric term across all registers.
#[derive(Debug, Clone, Copy)]
struct Accumulators {
    regs: [Register; REGISTERS],
    fused: bool,
}

impl Accumulators {
    #[inline(always)]
    fn new(fused: bool) -> Self {
        Self {
            regs: [Register::ZERO; REGISTERS],
            fused,
        }
    }

    /// Adds one 16-lane block given as `(u, v)` factor pairs per register.
    #[inline(always)]
    fn block(&mut self, terms: [(Register, Register); REGISTERS]) {
        if self.fused {
            for (acc, (u, v)) in self.regs.iter_mut().zip(terms) {
                *acc = acc.fused(u, v);
            }
        } else {
            let [p0, p1, p2, p3] = terms.map(|(u, v)| u.mul(v));
            self.regs[0] = self.regs[0].add(p0.add(p1).add(p2.add(p3)));
        }
    }

    /// Adds one 4-lane block into register 0.
    #[inline(always)]
    fn single(&mut self, u: Register, v: Register) {
        self.regs[0] = if self.fused {
            self.regs[0].fused(u, v)
        } else {
            self.regs[0].add(u.mul(v))
        };
    }

    #[inline(always)]
    fn total(&self) -> f32 {
        let [r0, r1, r2, r3] = self.regs;
        r0.add(r1).add(r2.add(r3)).reduce()
    }
}

/// Lane-parallel kernel that runs on any target.
///
/// Names: `lanes-x4-fma`, `lanes-x4` (multiply then add),
/// `lanes-x16-fma` and `lanes-x16-pairwise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneKernel {
    width: LaneWidth,
    fused: bool,
}

impl LaneKernel {
    /// Creates a kernel; `Accumulation::Auto` fuses only with hardware FMA.
    #[must_use]
    pub fn new(width: LaneWidth, accumulation: Accumulation) -> Self {
        let fused = match accumulation {
            Accumulation::Fused => true,
            Accumulation::Pairwise => false,
            Accumulation::Auto => has_hardware_fma(),
        };
        Self { width, fused }
    }

    /// Lane width of the main loop.
    #[must_use]
    pub fn width(&self) -> LaneWidth {
        self.width
    }

    /// Whether products are fused into the running sums.
    #[must_use]
    pub fn is_fused(&self) -> bool {
        self.fused
    }

    /// Sums `u * v` over all elements, where `(u, v) = operands(a, b)`.
    #[inline(always)]
    fn lane_sum(
        &self,
        a: &[f32],
        b: &[f32],
        operands: impl Fn(Register, Register) -> (Register, Register),
        tail_term: impl Fn(f32, f32) -> f32,
    ) -> f32 {
        let len = a.len();
        let mut acc = Accumulators::new(self.fused);
        let mut i = 0;

        if self.width == LaneWidth::X16 {
            while i + LANES * REGISTERS <= len {
                let terms: [(Register, Register); REGISTERS] = std::array::from_fn(|r| {
                    let offset = i + r * LANES;
                    operands(Register::load(&a[offset..]), Register::load(&b[offset..]))
                });
                acc.block(terms);
                i += LANES * REGISTERS;
            }
        }

        while i + LANES <= len {
            let (u, v) = operands(Register::load(&a[i..]), Register::load(&b[i..]));
            acc.single(u, v);
            i += LANES;
        }

        let simd_sum = acc.total();

        let mut remaining_sum = 0.0_f32;
        for (x, y) in a[i..].iter().zip(&b[i..]) {
            remaining_sum += tail_term(*x, *y);
        }

        simd_sum + remaining_sum
    }
}

impl MetricKernel for LaneKernel {
    fn name(&self) -> &'static str {
        match (self.width, self.fused) {
            (LaneWidth::X4, true) => "lanes-x4-fma",
            (LaneWidth::X4, false) => "lanes-x4",
            (LaneWidth::X16, true) => "lanes-x16-fma",
            (LaneWidth::X16, false) => "lanes-x16-pairwise",
        }
    }

    fn squared_l2(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        self.lane_sum(
            a,
            b,
            |va, vb| {
                let diff = va.sub(vb);
                (diff, diff)
            },
            |x, y| {
                let diff = x - y;
                diff * diff
            },
        )
    }

    fn inner_product(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        self.lane_sum(a, b, |va, vb| (va, vb), |x, y| x * y)
    }

    fn cosine(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        let len = a.len();
        let mut dot = Accumulators::new(self.fused);
        let mut norm_a = Accumulators::new(self.fused);
        let mut norm_b = Accumulators::new(self.fused);
        let mut i = 0;

        if self.width == LaneWidth::X16 {
            while i + LANES * REGISTERS <= len {
                let va: [Register; REGISTERS] =
                    std::array::from_fn(|r| Register::load(&a[i + r * LANES..]));
                let vb: [Register; REGISTERS] =
                    std::array::from_fn(|r| Register::load(&b[i + r * LANES..]));
                dot.block(std::array::from_fn(|r| (va[r], vb[r])));
                norm_a.block(va.map(|v| (v, v)));
                norm_b.block(vb.map(|v| (v, v)));
                i += LANES * REGISTERS;
            }
        }

        while i + LANES <= len {
            let va = Register::load(&a[i..]);
            let vb = Register::load(&b[i..]);
            dot.single(va, vb);
            norm_a.single(va, va);
            norm_b.single(vb, vb);
            i += LANES;
        }

        let (mut tail_dot, mut tail_a, mut tail_b) = (0.0_f32, 0.0_f32, 0.0_f32);
        for (&x, &y) in a[i..].iter().zip(&b[i..]) {
            tail_dot += x * y;
            tail_a += x * x;
            tail_b += y * y;
        }

        let dot = dot.total() + tail_dot;
        let norm_a = norm_a.total() + tail_a;
        let norm_b = norm_b.total() + tail_b;

        dot / (norm_a * norm_b).sqrt()
    }
}
