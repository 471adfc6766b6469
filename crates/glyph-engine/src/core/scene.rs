use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Spatial query the presentation boundary provides: which tagged drop
/// regions lie under a point.
pub trait HitTest {
    /// Owners of the regions under `point`, topmost first.
    /// Regions that declare no owner are omitted.
    fn owners_at(&self, point: Vec2) -> Vec<&str>;
}

/// Simple entity storage using a flat Vec.
/// Designed for small entity counts (dozens of cards and tiles).
/// Spawn order doubles as stacking order within a layer.
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: Vec::with_capacity(64),
        }
    }

    /// Add an entity to the scene, on top of everything already on its layer.
    pub fn spawn(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Remove an entity by ID. Returns the removed entity if found.
    /// Preserves the stacking order of the remaining entities.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    /// Get a reference to an entity by ID.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Iterate over all entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Find the first entity with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.tag == tag)
    }

    /// Find the first entity with the given tag (mutable).
    pub fn find_by_tag_mut(&mut self, tag: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.tag == tag)
    }

    /// Active entities containing `point`, topmost first: higher layers
    /// before lower ones, later spawns before earlier ones within a layer.
    pub fn entities_at(&self, point: Vec2) -> Vec<&Entity> {
        let mut hits: Vec<(usize, &Entity)> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.active && e.contains(point))
            .collect();
        hits.sort_by(|(ia, a), (ib, b)| b.layer.cmp(&a.layer).then(ib.cmp(ia)));
        hits.into_iter().map(|(_, e)| e).collect()
    }

    /// Number of entities in the scene.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Clear all entities.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl HitTest for Scene {
    fn owners_at(&self, point: Vec2) -> Vec<&str> {
        self.entities_at(point)
            .into_iter()
            .filter_map(|e| e.owner.as_deref())
            .collect()
    }
}
