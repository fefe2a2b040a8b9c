//! 8-wide float lanes.
//!
//! The batched triangle test is written against `F32Lanes` instead of a
//! particular instruction set. `wide::f32x8` is the production lane type
//! (AVX where available, SSE/NEON pairs or scalar otherwise);
//! `ScalarLanes` is a plain-array reference used to check it.
//!
//! Comparison results are masks in the SIMD convention: a true lane has
//! all bits set, a false lane is `0.0`.

use wide::{f32x8, CmpGe, CmpGt, CmpLe, CmpLt};

/// Number of lanes processed per batch.
pub const LANE_COUNT: usize = 8;

/// Lane type used by the mesh BVH unless another is requested.
pub type DefaultLanes = f32x8;

/// An 8-wide vector of `f32` with the operations needed by Möller–Trumbore.
pub trait F32Lanes: Copy + Send + Sync + 'static {
    fn splat(value: f32) -> Self;
    fn from_array(values: [f32; LANE_COUNT]) -> Self;
    fn to_array(self) -> [f32; LANE_COUNT];

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;
    /// `self * m + a`
    fn mul_add(self, m: Self, a: Self) -> Self;
    fn abs(self) -> Self;

    fn lt(self, rhs: Self) -> Self;
    fn le(self, rhs: Self) -> Self;
    fn gt(self, rhs: Self) -> Self;
    fn ge(self, rhs: Self) -> Self;
    fn and(self, rhs: Self) -> Self;
    fn or(self, rhs: Self) -> Self;

    /// Per lane: `mask ? on_true : on_false`.
    fn select(mask: Self, on_true: Self, on_false: Self) -> Self;

    /// One bit per lane, set where the mask lane is true.
    fn mask_bits(self) -> u8 {
        self.to_array()
            .iter()
            .enumerate()
            .fold(0u8, |bits, (i, v)| if v.to_bits() >> 31 == 1 { bits | (1 << i) } else { bits })
    }
}

// ===== wide::f32x8 =====

impl F32Lanes for f32x8 {
    #[inline(always)]
    fn splat(value: f32) -> Self {
        f32x8::splat(value)
    }

    #[inline(always)]
    fn from_array(values: [f32; LANE_COUNT]) -> Self {
        f32x8::from(values)
    }

    #[inline(always)]
    fn to_array(self) -> [f32; LANE_COUNT] {
        f32x8::to_array(self)
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        self / rhs
    }

    #[inline(always)]
    fn mul_add(self, m: Self, a: Self) -> Self {
        f32x8::mul_add(self, m, a)
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f32x8::abs(self)
    }

    #[inline(always)]
    fn lt(self, rhs: Self) -> Self {
        CmpLt::cmp_lt(self, rhs)
    }

    #[inline(always)]
    fn le(self, rhs: Self) -> Self {
        CmpLe::cmp_le(self, rhs)
    }

    #[inline(always)]
    fn gt(self, rhs: Self) -> Self {
        CmpGt::cmp_gt(self, rhs)
    }

    #[inline(always)]
    fn ge(self, rhs: Self) -> Self {
        CmpGe::cmp_ge(self, rhs)
    }

    #[inline(always)]
    fn and(self, rhs: Self) -> Self {
        self & rhs
    }

    #[inline(always)]
    fn or(self, rhs: Self) -> Self {
        self | rhs
    }

    #[inline(always)]
    fn select(mask: Self, on_true: Self, on_false: Self) -> Self {
        mask.blend(on_true, on_false)
    }
}

// ===== Scalar reference =====

/// Plain `[f32; 8]` lanes, evaluated one element at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarLanes(pub [f32; LANE_COUNT]);

const MASK_TRUE: u32 = u32::MAX;

impl ScalarLanes {
    #[inline]
    fn map2(self, rhs: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let mut out = [0.0; LANE_COUNT];
        for (i, o) in out.iter_mut().enumerate() {
            *o = f(self.0[i], rhs.0[i]);
        }
        ScalarLanes(out)
    }

    #[inline]
    fn compare(self, rhs: Self, f: impl Fn(f32, f32) -> bool) -> Self {
        self.map2(rhs, |a, b| if f(a, b) { f32::from_bits(MASK_TRUE) } else { 0.0 })
    }
}

impl F32Lanes for ScalarLanes {
    fn splat(value: f32) -> Self {
        ScalarLanes([value; LANE_COUNT])
    }

    fn from_array(values: [f32; LANE_COUNT]) -> Self {
        ScalarLanes(values)
    }

    fn to_array(self) -> [f32; LANE_COUNT] {
        self.0
    }

    fn add(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| a + b)
    }

    fn sub(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| a - b)
    }

    fn mul(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| a * b)
    }

    fn div(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| a / b)
    }

    fn mul_add(self, m: Self, a: Self) -> Self {
        self.mul(m).add(a)
    }

    fn abs(self) -> Self {
        ScalarLanes(self.0.map(f32::abs))
    }

    fn lt(self, rhs: Self) -> Self {
        self.compare(rhs, |a, b| a < b)
    }

    fn le(self, rhs: Self) -> Self {
        self.compare(rhs, |a, b| a <= b)
    }

    fn gt(self, rhs: Self) -> Self {
        self.compare(rhs, |a, b| a > b)
    }

    fn ge(self, rhs: Self) -> Self {
        self.compare(rhs, |a, b| a >= b)
    }

    fn and(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| f32::from_bits(a.to_bits() & b.to_bits()))
    }

    fn or(self, rhs: Self) -> Self {
        self.map2(rhs, |a, b| f32::from_bits(a.to_bits() | b.to_bits()))
    }

    fn select(mask: Self, on_true: Self, on_false: Self) -> Self {
        let mut out = [0.0; LANE_COUNT];
        for (i, o) in out.iter_mut().enumerate() {
            *o = if mask.0[i].to_bits() != 0 { on_true.0[i] } else { on_false.0[i] };
        }
        ScalarLanes(out)
    }
}

#[cfg(test)]
#[path = "lanes_tests.rs"]
mod tests;
