//! Math module — bounding boxes, SIMD lanes and ray-primitive tests.
//!
//! Built on `glam` vector types; everything here is a pure function or a
//! plain value type.

mod aabb;
pub mod lanes;
pub mod intersect;
pub mod line_clip;

pub use aabb::AABB;
pub use lanes::{F32Lanes, ScalarLanes, DefaultLanes, LANE_COUNT};
pub use intersect::{
    intersect_box_aabb, intersect_box_obb, intersect_triangle, intersect_triangles_x8,
    barycentric, TriangleHit, TrianglePacket, RAY_EPSILON, PARALLEL_EPSILON,
};
pub use line_clip::cohen_sutherland_line_clip;
