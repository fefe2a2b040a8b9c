//! Scene module — entity store, scene-level BVH and raycast orchestration.
//!
//! The scene BVH indexes entities by world AABB and is rebuilt every tick;
//! raycasts combine it with the per-mesh BVHs to resolve a world ray to a
//! hit entity, point, normal and UV.

mod entity;
mod scene;
mod scene_index;
mod scene_tree;
mod scene_bvh;
mod raycast;

pub use entity::{Entity, EntityDesc, EntityKey};
pub use scene::Scene;
pub use scene_index::SceneIndex;
pub use scene_tree::{SceneBvhNode, SceneBvhNodeKind, SceneRayHit, SceneTree, SAH_BIN_COUNT};
pub use scene_bvh::{SceneBvh, SceneBvhSnapshot};
pub use raycast::{
    raycast_entity, raycast_nearest, raycast_scene, EntityRayHit, RaycastOptions,
};
