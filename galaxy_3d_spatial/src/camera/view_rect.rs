/// Screen-space visibility test for bounding boxes.
///
/// Projects the 8 corners of a world AABB to normalized device coordinates
/// and decides whether the projected box overlaps the `[-1, 1]²` view
/// rectangle. Complements the plane-based `Frustum` test, which is
/// conservative near frustum corners.

use glam::{Mat4, Vec2, Vec4Swizzles};
use crate::math::{cohen_sutherland_line_clip, AABB};

const RECT_MIN: Vec2 = Vec2::splat(-1.0);
const RECT_MAX: Vec2 = Vec2::splat(1.0);

/// Returns true if the projection of `aabb` overlaps the view rectangle.
///
/// Accepts when a projected corner is inside the rectangle, when any of the
/// 12 projected edges crosses it, or when the rectangle centre lies inside a
/// projected face (box covering the whole screen). A corner at or behind the
/// eye plane makes the projection unreliable, so the box is accepted.
pub fn aabb_overlaps_view_rect(aabb: &AABB, view_projection: &Mat4) -> bool {
    if aabb.is_empty() {
        return false;
    }

    let mut projected = [Vec2::ZERO; 8];
    for (slot, corner) in projected.iter_mut().zip(aabb.corners()) {
        let clip = *view_projection * corner.extend(1.0);
        if clip.w <= f32::EPSILON {
            return true;
        }
        let ndc = clip.xy() / clip.w;
        if ndc.cmpge(RECT_MIN).all() && ndc.cmple(RECT_MAX).all() {
            return true;
        }
        *slot = ndc;
    }

    for bit in [1usize, 2, 4] {
        for i in (0..8).filter(|i| i & bit == 0) {
            if cohen_sutherland_line_clip(projected[i], projected[i | bit], RECT_MIN, RECT_MAX) {
                return true;
            }
        }
    }

    box_faces().iter().any(|face| {
        let quad = face.map(|i| projected[i]);
        quad_contains(&quad, Vec2::ZERO)
    })
}

/// The 6 faces of a box as corner indices in cyclic order.
fn box_faces() -> [[usize; 4]; 6] {
    let mut faces = [[0; 4]; 6];
    let mut n = 0;
    for (axis, p, q) in [(1usize, 2usize, 4usize), (2, 4, 1), (4, 1, 2)] {
        for base in [0, axis] {
            faces[n] = [base, base | p, base | p | q, base | q];
            n += 1;
        }
    }
    faces
}

/// Point-in-convex-quad by edge cross-product signs. Degenerate (edge-on)
/// quads contain nothing.
fn quad_contains(quad: &[Vec2; 4], point: Vec2) -> bool {
    let area: f32 = (0..4).map(|k| quad[k].perp_dot(quad[(k + 1) % 4])).sum();
    if area.abs() <= 1e-9 {
        return false;
    }

    let mut positive = false;
    let mut negative = false;
    for k in 0..4 {
        let edge = quad[(k + 1) % 4] - quad[k];
        let side = edge.perp_dot(point - quad[k]);
        positive |= side > 0.0;
        negative |= side < 0.0;
    }
    !(positive && negative)
}
