/// Tests for Scene
///
/// Entity lifecycle through SlotMap keys, name lookup, stale keys and
/// world-AABB eligibility.

use std::sync::Arc;
use glam::{Mat4, Quat, Vec3};
use crate::error::Error;
use crate::mesh::{Mesh, MeshGeometry};
use super::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn unit_cube() -> Arc<Mesh> {
    let positions: Vec<Vec3> = (0..8)
        .map(|i| Vec3::new(
            if i & 1 == 0 { -0.5 } else { 0.5 },
            if i & 2 == 0 { -0.5 } else { 0.5 },
            if i & 4 == 0 { -0.5 } else { 0.5 },
        ))
        .collect();
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -Z
        4, 5, 6, 5, 7, 6, // +Z
        0, 1, 4, 1, 5, 4, // -Y
        2, 6, 3, 3, 6, 7, // +Y
        0, 4, 2, 2, 4, 6, // -X
        1, 3, 5, 3, 7, 5, // +X
    ];
    Arc::new(Mesh::new("cube", MeshGeometry::from_positions(&positions, indices).unwrap()))
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_create_and_get() {
    let mut scene = Scene::new();
    assert!(scene.is_empty());

    let key = scene.create_entity(EntityDesc::new("a"));
    assert_eq!(scene.entity_count(), 1);
    assert!(scene.contains(key));
    assert_eq!(scene.entity(key).unwrap().name(), "a");
    assert_eq!(scene.find_entity("a"), Some(key));
}

#[test]
fn test_remove_makes_key_stale() {
    let mut scene = Scene::new();
    let key = scene.create_entity(EntityDesc::new("a"));

    assert!(scene.remove_entity(key));
    assert!(!scene.remove_entity(key));
    assert!(scene.entity(key).is_none());
    assert!(scene.find_entity("a").is_none());
}

#[test]
fn test_stale_key_not_reused_by_new_entity() {
    let mut scene = Scene::new();
    let old = scene.create_entity(EntityDesc::new("a"));
    scene.remove_entity(old);
    let new = scene.create_entity(EntityDesc::new("b"));

    assert_ne!(old, new);
    assert!(scene.entity(old).is_none());
}

#[test]
fn test_duplicate_names_latest_wins() {
    let mut scene = Scene::new();
    let first = scene.create_entity(EntityDesc::new("dup"));
    let second = scene.create_entity(EntityDesc::new("dup"));
    assert_eq!(scene.find_entity("dup"), Some(second));

    // Removing the shadowed entity keeps the newer mapping
    scene.remove_entity(first);
    assert_eq!(scene.find_entity("dup"), Some(second));
}

#[test]
fn test_setters_on_stale_key_fail() {
    let mut scene = Scene::new();
    let key = scene.create_entity(EntityDesc::new("a"));
    scene.remove_entity(key);

    assert!(matches!(scene.set_world_matrix(key, Mat4::IDENTITY), Err(Error::InvalidEntity(_))));
    assert!(matches!(scene.set_enabled(key, false), Err(Error::InvalidEntity(_))));
    assert!(matches!(scene.set_mesh(key, None), Err(Error::InvalidEntity(_))));
}

#[test]
fn test_setters_update_entity() {
    let mut scene = Scene::new();
    let key = scene.create_entity(EntityDesc::new("a"));
    let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    scene.set_world_matrix(key, m).unwrap();
    scene.set_enabled(key, false).unwrap();
    scene.set_mesh(key, Some(unit_cube())).unwrap();

    let entity = scene.entity(key).unwrap();
    assert_eq!(*entity.world_matrix(), m);
    assert!(!entity.is_enabled());
    assert!(entity.mesh().is_some());
}

#[test]
fn test_clear() {
    let mut scene = Scene::new();
    let key = scene.create_entity(EntityDesc::new("a"));
    scene.clear();
    assert!(scene.is_empty());
    assert!(scene.entity(key).is_none());
    assert!(scene.find_entity("a").is_none());
}

#[test]
fn test_entities_iteration() {
    let mut scene = Scene::new();
    for i in 0..5 {
        scene.create_entity(EntityDesc::new(format!("e{}", i)));
    }
    assert_eq!(scene.entities().count(), 5);
}

// ============================================================================
// World AABB eligibility
// ============================================================================

#[test]
fn test_world_aabb_translated() {
    let entity = Entity::from_desc(EntityDesc::new("a")
        .with_mesh(unit_cube())
        .with_world_matrix(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))));

    let aabb = entity.world_aabb().unwrap();
    assert!(aabb.min.abs_diff_eq(Vec3::new(4.5, -0.5, -0.5), 1e-6));
    assert!(aabb.max.abs_diff_eq(Vec3::new(5.5, 0.5, 0.5), 1e-6));
}

#[test]
fn test_world_aabb_rotated_bounds_all_corners() {
    let rotation = Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
    let entity = Entity::from_desc(EntityDesc::new("a")
        .with_mesh(unit_cube())
        .with_world_matrix(rotation));

    let aabb = entity.world_aabb().unwrap();
    let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
    assert!((aabb.max.x - half_diagonal).abs() < 1e-5);
    assert!((aabb.max.y - half_diagonal).abs() < 1e-5);
    assert!((aabb.max.z - 0.5).abs() < 1e-6);
}

#[test]
fn test_world_aabb_requires_enabled_renderable_mesh() {
    let mesh = unit_cube();
    let no_mesh = Entity::from_desc(EntityDesc::new("a"));
    let disabled = Entity::from_desc(EntityDesc::new("b").with_mesh(mesh.clone()).with_enabled(false));
    let hidden = Entity::from_desc(EntityDesc::new("c").with_mesh(mesh).with_renderable(false));

    assert!(no_mesh.world_aabb().is_none());
    assert!(disabled.world_aabb().is_none());
    assert!(hidden.world_aabb().is_none());
}

#[test]
fn test_world_aabb_empty_mesh_is_none() {
    let empty = Arc::new(Mesh::new("empty", MeshGeometry::from_positions(&[], Vec::new()).unwrap()));
    let entity = Entity::from_desc(EntityDesc::new("a").with_mesh(empty));
    assert!(entity.world_aabb().is_none());
}
