/// Spatial index seam used by the renderer's culling pass.
///
/// A SceneIndex answers visibility queries over entities by their
/// world-space AABB. The scene BVH implements it; other structures
/// (octree, grid) can be dropped in behind the same trait.

use glam::Mat4;
use crate::camera::Frustum;
use crate::math::AABB;
use super::entity::EntityKey;

pub trait SceneIndex: Send + Sync {
    /// Entities whose world AABB intersects the frustum.
    /// Results are appended to `results`.
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<EntityKey>);

    /// Entities whose projected world AABB overlaps the screen rectangle.
    /// Results are appended to `results`.
    fn query_view_rect(&self, view_projection: &Mat4, results: &mut Vec<EntityKey>);

    /// Bounds of everything indexed (empty box when nothing is).
    fn root_aabb(&self) -> AABB;
}
