/// Frustum — six clipping planes used to cull scene BVH nodes.
///
/// Each plane is a Vec4 (A, B, C, D) with an inward-pointing unit normal:
/// a point P is on the visible side when `dot(plane.xyz, P) + D >= 0`.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};
use crate::math::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// `Inside` lets a hierarchy collect a whole subtree without further tests,
/// `Outside` prunes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    Outside,
    Inside,
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract normalized planes from a view-projection matrix
    /// (Gribb & Hartmann, 0..1 depth range).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0,
            row3 - row0,
            row3 + row1,
            row3 - row1,
            row2,
            row3 - row2,
        ];

        for plane in &mut planes {
            let len = plane.xyz().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Corner of `aabb` furthest along `normal` (p-vertex) and the opposite one (n-vertex).
    fn extreme_corners(aabb: &AABB, normal: Vec3) -> (Vec3, Vec3) {
        let positive = normal.cmpge(Vec3::ZERO);
        (
            Vec3::select(positive, aabb.max, aabb.min),
            Vec3::select(positive, aabb.min, aabb.max),
        )
    }

    /// Conservative overlap test: may report `true` for a box just outside
    /// a frustum corner, never `false` for a visible box.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let (p_vertex, _) = Self::extreme_corners(aabb, plane.xyz());
            plane.xyz().dot(p_vertex) + plane.w >= 0.0
        })
    }

    /// Classify an AABB as fully outside, fully inside or straddling.
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.xyz();
            let (p_vertex, n_vertex) = Self::extreme_corners(aabb, normal);

            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
