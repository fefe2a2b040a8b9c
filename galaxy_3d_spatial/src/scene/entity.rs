/// Entity types consumed by the spatial subsystem.
///
/// The scene store owns entities; hierarchies refer to them only through
/// an `EntityKey` and resolve it at query time. A key whose entity has been
/// removed resolves to nothing.

use std::sync::Arc;
use glam::Mat4;
use slotmap::new_key_type;
use crate::math::AABB;
use crate::mesh::Mesh;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable, generation-checked key for an Entity within a Scene.
    ///
    /// Keys remain valid even after other entities are removed.
    /// A key becomes invalid only when its own entity is removed.
    pub struct EntityKey;
}

/// Creation parameters for an Entity.
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub name: String,
    pub mesh: Option<Arc<Mesh>>,
    pub world_matrix: Mat4,
    pub enabled: bool,
    pub renderable: bool,
}

impl EntityDesc {
    /// Enabled, renderable entity at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: None,
            world_matrix: Mat4::IDENTITY,
            enabled: true,
            renderable: true,
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_world_matrix(mut self, world_matrix: Mat4) -> Self {
        self.world_matrix = world_matrix;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_renderable(mut self, renderable: bool) -> Self {
        self.renderable = renderable;
        self
    }
}

/// A scene object as seen by the hierarchies.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    mesh: Option<Arc<Mesh>>,
    world_matrix: Mat4,
    enabled: bool,
    renderable: bool,
}

impl Entity {
    pub(crate) fn from_desc(desc: EntityDesc) -> Self {
        Self {
            name: desc.name,
            mesh: desc.mesh,
            world_matrix: desc.world_matrix,
            enabled: desc.enabled,
            renderable: desc.renderable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    pub(crate) fn set_world_matrix(&mut self, world_matrix: Mat4) {
        self.world_matrix = world_matrix;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_mesh(&mut self, mesh: Option<Arc<Mesh>>) {
        self.mesh = mesh;
    }

    /// World-space bounds of the mesh, if this entity takes part in
    /// spatial queries (enabled, renderable, non-empty mesh).
    pub fn world_aabb(&self) -> Option<AABB> {
        if !self.enabled || !self.renderable {
            return None;
        }
        let local = self.mesh.as_ref()?.local_aabb();
        if local.is_empty() {
            return None;
        }
        let world = local.transformed(&self.world_matrix);
        (world.min.is_finite() && world.max.is_finite()).then_some(world)
    }
}
