/// Mesh asset as consumed by the spatial subsystem.
///
/// Owns its geometry, the mesh-local bounding box and the triangle BVH.
/// The BVH is built once in the constructor and never changes afterwards,
/// so a `Mesh` is shared between entities behind an `Arc`.

use glam::Vec3;
use crate::config::SpatialConfig;
use crate::math::AABB;
use super::geometry::MeshGeometry;
use super::mesh_bvh::{MeshBvh, MeshRayHit, DEFAULT_LEAF_SIZE};

#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    geometry: MeshGeometry,
    local_aabb: AABB,
    bvh: MeshBvh,
}

impl Mesh {
    /// Build a mesh with the default BVH leaf size.
    pub fn new(name: impl Into<String>, geometry: MeshGeometry) -> Self {
        Self::with_leaf_size(name, geometry, DEFAULT_LEAF_SIZE)
    }

    /// Build a mesh using the leaf size from `config`.
    pub fn from_config(name: impl Into<String>, geometry: MeshGeometry, config: &SpatialConfig) -> Self {
        Self::with_leaf_size(name, geometry, config.mesh_leaf_size)
    }

    pub fn with_leaf_size(name: impl Into<String>, geometry: MeshGeometry, leaf_size: usize) -> Self {
        let bvh = MeshBvh::build(&geometry, leaf_size);
        // Nothing to hit: keep the mesh out of the scene tree
        let local_aabb = if bvh.is_empty() { AABB::empty() } else { geometry.local_aabb() };
        Self {
            name: name.into(),
            geometry,
            local_aabb,
            bvh,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// Bounds of all vertex positions in mesh space.
    pub fn local_aabb(&self) -> &AABB {
        &self.local_aabb
    }

    pub fn bvh(&self) -> &MeshBvh {
        &self.bvh
    }

    /// Mesh-space raycast, nearest hit first.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_length: f32) -> Vec<MeshRayHit> {
        self.bvh.raycast(&self.geometry, origin, dir, max_length)
    }
}
