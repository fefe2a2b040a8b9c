//! Ray-primitive intersection tests.
//!
//! Scalar tests for boxes and single triangles, plus a batched
//! Möller–Trumbore test over 8 triangles at a time. Every test returns
//! `None` (or `+inf` per lane) for a miss; degenerate input is a miss, never
//! a panic or a NaN distance.
//!
//! Distances are in units of `dir`. Callers that want world distances pass a
//! normalized direction.

use glam::{Quat, Vec3};
use super::lanes::{F32Lanes, LANE_COUNT};

/// Hits closer than this to the ray origin are rejected.
pub const RAY_EPSILON: f32 = 1e-6;

/// Determinant threshold below which a ray counts as parallel to a triangle.
pub const PARALLEL_EPSILON: f32 = 1e-8;

// ============================================================================
// Boxes
// ============================================================================

/// Slab test of a ray against an axis-aligned box.
///
/// Returns the entry distance clamped to `[0, max_length]` (0 when the origin
/// is inside the box). A zero direction component disables that axis'
/// constraint only when the origin already lies inside the slab.
pub fn intersect_box_aabb(
    origin: Vec3,
    dir: Vec3,
    min: Vec3,
    max: Vec3,
    max_length: f32,
) -> Option<f32> {
    let inv_dir = dir.recip();
    let mut t_min = 0.0f32;
    let mut t_max = max_length;

    for axis in 0..3 {
        if dir[axis] == 0.0 {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }

        let t1 = (min[axis] - origin[axis]) * inv_dir[axis];
        let t2 = (max[axis] - origin[axis]) * inv_dir[axis];
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));

        if t_max < t_min {
            return None;
        }
    }

    Some(t_min)
}

/// Ray against an oriented box given as a local AABB placed by a
/// translation/rotation/scale.
///
/// The ray is projected onto each of the box's rotated basis vectors and the
/// local extents are scaled by `scale`. Returns the entry distance clamped to
/// `[0, max_length]`.
#[allow(clippy::too_many_arguments)]
pub fn intersect_box_obb(
    origin: Vec3,
    dir: Vec3,
    local_min: Vec3,
    local_max: Vec3,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    max_length: f32,
) -> Option<f32> {
    let mut t_min = 0.0f32;
    let mut t_max = max_length;
    let delta = position - origin;

    for (i, basis) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().enumerate() {
        let axis = rotation * basis;
        let e = axis.dot(delta);
        let f = dir.dot(axis);

        let a = local_min[i] * scale[i];
        let b = local_max[i] * scale[i];
        let (lo, hi) = (a.min(b), a.max(b));

        if f.abs() > PARALLEL_EPSILON {
            let mut t1 = (e + lo) / f;
            let mut t2 = (e + hi) / f;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_max = t_max.min(t2);
            t_min = t_min.max(t1);
            if t_max < t_min {
                return None;
            }
        } else if -e + lo > 0.0 || -e + hi < 0.0 {
            // Parallel to this slab and outside it
            return None;
        }
    }

    Some(t_min)
}

// ============================================================================
// Single triangle
// ============================================================================

/// A ray/triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray
    pub distance: f32,
    /// Intersection point
    pub point: Vec3,
}

/// Ray against one triangle via its supporting plane.
///
/// The plane hit is accepted when it lies in front of the origin, within
/// `max_length`, and on the inner side of all three edges (the sign of
/// `normal · (edge × to_point)` agrees for every edge, so either winding of
/// `normal` works). Both faces are hit.
pub fn intersect_triangle(
    origin: Vec3,
    dir: Vec3,
    a: Vec3,
    b: Vec3,
    c: Vec3,
    normal: Vec3,
    max_length: f32,
) -> Option<TriangleHit> {
    let n = normal.normalize_or_zero();
    let dir_len = dir.length();
    if n == Vec3::ZERO || dir_len == 0.0 {
        return None;
    }

    let denom = n.dot(dir);
    if denom.abs() < PARALLEL_EPSILON * dir_len {
        return None;
    }

    let t = n.dot(a - origin) / denom;
    if !t.is_finite() || t <= RAY_EPSILON {
        return None;
    }

    let point = origin + dir * t;
    let offset = point - origin;
    if offset.normalize_or_zero().dot(dir) < 0.0 {
        return None;
    }
    if t > max_length {
        return None;
    }

    let mut positive = 0;
    let mut negative = 0;
    for (p, q) in [(a, b), (b, c), (c, a)] {
        let side = n.dot((q - p).cross(point - p));
        if side > 0.0 {
            positive += 1;
        } else if side < 0.0 {
            negative += 1;
        }
    }
    if positive > 0 && negative > 0 {
        return None;
    }

    Some(TriangleHit { distance: t, point })
}

/// Barycentric weights `(w0, w1, w2)` of `point` with respect to `a`, `b`, `c`.
///
/// Returns `(1, 0, 0)` for a zero-area triangle.
pub fn barycentric(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = point - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON * d00.max(d11).max(1.0) {
        return Vec3::X;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - v - w, v, w)
}

// ============================================================================
// 8-wide Möller–Trumbore
// ============================================================================

/// Up to 8 triangles in structure-of-arrays layout.
///
/// Unused lanes hold a zero-area triangle at the origin, whose determinant is
/// exactly zero, so they always report `+inf`.
#[derive(Debug, Clone, Copy)]
pub struct TrianglePacket<L: F32Lanes> {
    pub v0: [L; 3],
    pub edge1: [L; 3],
    pub edge2: [L; 3],
    /// Number of real triangles (the rest is padding)
    pub len: usize,
}

impl<L: F32Lanes> TrianglePacket<L> {
    /// Pack up to `LANE_COUNT` triangles; extra triangles are ignored.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let len = triangles.len().min(LANE_COUNT);
        let mut v0 = [[0.0f32; LANE_COUNT]; 3];
        let mut edge1 = [[0.0f32; LANE_COUNT]; 3];
        let mut edge2 = [[0.0f32; LANE_COUNT]; 3];

        for (lane, [a, b, c]) in triangles.iter().take(len).enumerate() {
            let e1 = *b - *a;
            let e2 = *c - *a;
            for axis in 0..3 {
                v0[axis][lane] = a[axis];
                edge1[axis][lane] = e1[axis];
                edge2[axis][lane] = e2[axis];
            }
        }

        Self {
            v0: v0.map(L::from_array),
            edge1: edge1.map(L::from_array),
            edge2: edge2.map(L::from_array),
            len,
        }
    }
}

/// Möller–Trumbore for one ray against every lane of `packet`.
///
/// Lane `i` holds the hit distance, or `+inf` when the ray is parallel
/// (`|det| < PARALLEL_EPSILON`), the barycentrics leave the triangle, or
/// `t <= RAY_EPSILON`. Lanes never contain NaN or a negative distance.
pub fn intersect_triangles_x8<L: F32Lanes>(
    origin: Vec3,
    dir: Vec3,
    packet: &TrianglePacket<L>,
) -> [f32; LANE_COUNT] {
    let [dx, dy, dz] = dir.to_array().map(L::splat);
    let [ox, oy, oz] = origin.to_array().map(L::splat);
    let [e1x, e1y, e1z] = packet.edge1;
    let [e2x, e2y, e2z] = packet.edge2;
    let [v0x, v0y, v0z] = packet.v0;

    let zero = L::splat(0.0);
    let one = L::splat(1.0);

    // h = dir × edge2
    let hx = dy.mul(e2z).sub(dz.mul(e2y));
    let hy = dz.mul(e2x).sub(dx.mul(e2z));
    let hz = dx.mul(e2y).sub(dy.mul(e2x));

    // det = edge1 · h
    let det = e1x.mul_add(hx, e1y.mul_add(hy, e1z.mul(hz)));
    let not_parallel = det.abs().ge(L::splat(PARALLEL_EPSILON));
    let inv_det = one.div(det);

    // s = origin - v0
    let sx = ox.sub(v0x);
    let sy = oy.sub(v0y);
    let sz = oz.sub(v0z);

    let u = inv_det.mul(sx.mul_add(hx, sy.mul_add(hy, sz.mul(hz))));

    // q = s × edge1
    let qx = sy.mul(e1z).sub(sz.mul(e1y));
    let qy = sz.mul(e1x).sub(sx.mul(e1z));
    let qz = sx.mul(e1y).sub(sy.mul(e1x));

    let v = inv_det.mul(dx.mul_add(qx, dy.mul_add(qy, dz.mul(qz))));
    let t = inv_det.mul(e2x.mul_add(qx, e2y.mul_add(qy, e2z.mul(qz))));

    // NaN in u, v or t fails every comparison below.
    let valid = not_parallel
        .and(u.ge(zero))
        .and(u.le(one))
        .and(v.ge(zero))
        .and(u.add(v).le(one))
        .and(t.gt(L::splat(RAY_EPSILON)));

    L::select(valid, t, L::splat(f32::INFINITY)).to_array()
}

#[cfg(test)]
#[path = "intersect_tests.rs"]
mod tests;
