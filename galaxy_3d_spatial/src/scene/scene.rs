/// Scene - entity store consumed by the hierarchies.
///
/// Uses a SlotMap for O(1) insert/remove with stable, generation-checked
/// keys. The scene BVH reads it once per rebuild; raycasts resolve leaf keys
/// against it at query time.

use std::sync::Arc;
use glam::Mat4;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::error::Result;
use crate::engine_bail;
use crate::mesh::Mesh;
use super::entity::{Entity, EntityDesc, EntityKey};

#[derive(Debug, Default)]
pub struct Scene {
    entities: SlotMap<EntityKey, Entity>,
    /// Name to key (most recently created entity wins on duplicates)
    names: FxHashMap<String, EntityKey>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            names: FxHashMap::default(),
        }
    }

    /// Add an entity and return its key.
    pub fn create_entity(&mut self, desc: EntityDesc) -> EntityKey {
        let name = desc.name.clone();
        let key = self.entities.insert(Entity::from_desc(desc));
        self.names.insert(name, key);
        key
    }

    /// Remove an entity. Returns false if the key was already stale.
    ///
    /// Hierarchies built before the removal keep the key; it resolves to
    /// `None` from now on.
    pub fn remove_entity(&mut self, key: EntityKey) -> bool {
        let Some(entity) = self.entities.remove(key) else {
            return false;
        };
        if self.names.get(entity.name()) == Some(&key) {
            self.names.remove(entity.name());
        }
        true
    }

    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn find_entity(&self, name: &str) -> Option<EntityKey> {
        self.names.get(name).copied()
    }

    fn entity_mut(&mut self, key: EntityKey) -> Result<&mut Entity> {
        match self.entities.get_mut(key) {
            Some(entity) => Ok(entity),
            None => engine_bail!("galaxy3d::Scene", InvalidEntity,
                "Entity {:?} does not exist", key),
        }
    }

    pub fn set_world_matrix(&mut self, key: EntityKey, world_matrix: Mat4) -> Result<()> {
        self.entity_mut(key)?.set_world_matrix(world_matrix);
        Ok(())
    }

    pub fn set_enabled(&mut self, key: EntityKey, enabled: bool) -> Result<()> {
        self.entity_mut(key)?.set_enabled(enabled);
        Ok(())
    }

    pub fn set_mesh(&mut self, key: EntityKey, mesh: Option<Arc<Mesh>>) -> Result<()> {
        self.entity_mut(key)?.set_mesh(mesh);
        Ok(())
    }

    /// Iterate over all entities in storage order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove every entity (all outstanding keys become stale).
    pub fn clear(&mut self) {
        self.entities.clear();
        self.names.clear();
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
