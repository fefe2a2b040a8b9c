//! Mesh module — raw geometry, mesh asset and the per-mesh triangle BVH.

mod geometry;
mod mesh;
mod mesh_bvh;

pub use geometry::{MeshGeometry, VertexLayout};
pub use mesh::Mesh;
pub use mesh_bvh::{MeshBvh, MeshBvhNode, MeshBvhNodeKind, MeshRayHit, DEFAULT_LEAF_SIZE};
