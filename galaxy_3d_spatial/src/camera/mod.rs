//! Camera module — view-volume tests used by culling queries.
//!
//! The spatial subsystem does not own cameras; callers pass a
//! view-projection matrix and get back either a plane-based `Frustum` or a
//! screen-rectangle overlap answer.

mod frustum;
mod view_rect;

pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use view_rect::aabb_overlaps_view_rect;
