/// Scene raycast - coarse scene BVH pass followed by per-mesh refinement.
///
/// The scene tree yields entities whose world AABB the ray enters, nearest
/// first. Each candidate is resolved against the scene (stale or disabled
/// entities are skipped), the ray is moved into the entity's local space
/// and tested against its mesh BVH, and hits are carried back to world
/// space.
///
/// # Example
///
/// ```ignore
/// let scene = scene.read();
/// let hit = raycast_nearest(&scene, &bvh.snapshot(), origin, dir, 1000.0, &RaycastOptions::default());
/// ```

use glam::{Mat3, Mat4, Vec2, Vec3};
use crate::config::SpatialConfig;
use crate::engine_debug;
use crate::math::{intersect_box_aabb, intersect_box_obb, AABB};
use crate::mesh::{Mesh, MeshRayHit};
use super::entity::{Entity, EntityKey};
use super::scene::Scene;
use super::scene_tree::SceneTree;

/// Tuning for scene raycasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaycastOptions {
    /// Only refine the nearest N candidate entities (None = all)
    pub max_candidates: Option<usize>,
    /// Stop refining once a hit is closer than the next candidate's AABB.
    /// The nearest hit is unaffected; farther hits may be left out.
    pub early_exit: bool,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_candidates: None,
            early_exit: true,
        }
    }
}

impl RaycastOptions {
    pub fn from_config(config: &SpatialConfig) -> Self {
        Self {
            max_candidates: config.max_raycast_candidates,
            early_exit: config.early_exit,
        }
    }
}

/// A ray/entity hit in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRayHit {
    pub entity: EntityKey,
    /// World distance from the ray origin
    pub distance: f32,
    /// World hit point
    pub position: Vec3,
    /// World unit normal
    pub normal: Vec3,
    pub uv: Vec2,
    /// Triangle index within the entity's mesh
    pub triangle: u32,
}

/// Hits of a world ray against the scene, nearest first.
///
/// `tree` is normally a `SceneBvh::snapshot()`; `scene` must be the store
/// the tree was built from.
pub fn raycast_scene(
    scene: &Scene,
    tree: &SceneTree,
    origin: Vec3,
    dir: Vec3,
    max_length: f32,
    options: &RaycastOptions,
) -> Vec<EntityRayHit> {
    let mut hits = Vec::new();
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return hits;
    }

    let limit = options.max_candidates.unwrap_or(usize::MAX);
    let mut nearest = f32::INFINITY;

    for candidate in tree.raycast(origin, dir, max_length).iter().take(limit) {
        if options.early_exit && nearest < candidate.distance {
            break;
        }
        // Removed since the tree was built
        let Some(entity) = scene.entity(candidate.entity) else {
            continue;
        };
        if !entity.is_enabled() {
            continue;
        }
        let Some(mesh) = entity.mesh() else {
            continue;
        };

        for hit in mesh_hits(candidate.entity, entity, mesh, origin, dir, max_length) {
            nearest = nearest.min(hit.distance);
            hits.push(hit);
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Nearest hit of a world ray against the scene.
pub fn raycast_nearest(
    scene: &Scene,
    tree: &SceneTree,
    origin: Vec3,
    dir: Vec3,
    max_length: f32,
    options: &RaycastOptions,
) -> Option<EntityRayHit> {
    raycast_scene(scene, tree, origin, dir, max_length, options).into_iter().next()
}

/// Hits of a world ray against a single entity, nearest first.
///
/// The entity's local AABB is pre-tested before the mesh BVH is walked: as
/// an oriented box when the world matrix has orthogonal axes, otherwise
/// against the local box with the ray moved into local space.
pub fn raycast_entity(
    scene: &Scene,
    key: EntityKey,
    origin: Vec3,
    dir: Vec3,
    max_length: f32,
) -> Vec<EntityRayHit> {
    let dir = dir.normalize_or_zero();
    let Some(entity) = scene.entity(key) else {
        return Vec::new();
    };
    let Some(mesh) = entity.mesh() else {
        return Vec::new();
    };
    if !entity.is_enabled() || dir == Vec3::ZERO || mesh.local_aabb().is_empty() {
        return Vec::new();
    }

    if !bounds_pretest(entity.world_matrix(), mesh.local_aabb(), origin, dir, max_length) {
        return Vec::new();
    }

    let mut hits = mesh_hits(key, entity, mesh, origin, dir, max_length);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Whether a world ray (`dir` normalized) can reach the box `local` placed
/// by `world`. Inconclusive cases pass.
fn bounds_pretest(world: &Mat4, local: &AABB, origin: Vec3, dir: Vec3, max_length: f32) -> bool {
    if has_orthogonal_axes(world) {
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        if scale.is_finite() && rotation.is_finite() && translation.is_finite() {
            return intersect_box_obb(
                origin, dir, local.min, local.max, translation, rotation, scale, max_length,
            )
            .is_some();
        }
        return true;
    }

    // Sheared: an affine inverse keeps the ray parameter in world units
    match invert(world) {
        Some(inverse) => intersect_box_aabb(
            inverse.transform_point3(origin),
            inverse.transform_vector3(dir),
            local.min,
            local.max,
            max_length,
        )
        .is_some(),
        None => true,
    }
}

fn has_orthogonal_axes(matrix: &Mat4) -> bool {
    const TOLERANCE: f32 = 1e-4;
    let x = matrix.x_axis.truncate().normalize_or_zero();
    let y = matrix.y_axis.truncate().normalize_or_zero();
    let z = matrix.z_axis.truncate().normalize_or_zero();
    if x == Vec3::ZERO || y == Vec3::ZERO || z == Vec3::ZERO {
        return false;
    }
    x.dot(y).abs() < TOLERANCE && y.dot(z).abs() < TOLERANCE && z.dot(x).abs() < TOLERANCE
}

/// Mesh-BVH hits of a world ray (`dir` normalized) carried to world space.
fn mesh_hits(
    key: EntityKey,
    entity: &Entity,
    mesh: &Mesh,
    origin: Vec3,
    dir: Vec3,
    max_length: f32,
) -> Vec<EntityRayHit> {
    let world = *entity.world_matrix();
    let Some(inverse) = invert(&world) else {
        engine_debug!("galaxy3d::Raycast",
            "Skipping entity '{}': world matrix is not invertible", entity.name());
        return Vec::new();
    };

    let local_origin = inverse.transform_point3(origin);
    let local_dir = inverse.transform_vector3(dir);
    // Local units per world unit along the ray
    let scale = local_dir.length();
    if !(scale > 0.0) || !scale.is_finite() {
        return Vec::new();
    }

    let normal_matrix = Mat3::from_mat4(inverse).transpose();

    mesh.raycast(local_origin, local_dir, max_length * scale)
        .into_iter()
        .map(|hit| to_world(key, &world, &normal_matrix, scale, hit))
        .filter(|hit| hit.distance <= max_length)
        .collect()
}

fn invert(matrix: &Mat4) -> Option<Mat4> {
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() <= f32::MIN_POSITIVE {
        return None;
    }
    let inverse = matrix.inverse();
    inverse.is_finite().then_some(inverse)
}

fn to_world(key: EntityKey, world: &Mat4, normal_matrix: &Mat3, scale: f32, hit: MeshRayHit) -> EntityRayHit {
    EntityRayHit {
        entity: key,
        distance: hit.distance / scale,
        position: world.transform_point3(hit.point),
        normal: (*normal_matrix * hit.normal).normalize_or_zero(),
        uv: hit.uv,
        triangle: hit.triangle,
    }
}

#[cfg(test)]
#[path = "raycast_tests.rs"]
mod tests;
