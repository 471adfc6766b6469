use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::layer::RenderLayer;

/// An entity is an axis-aligned box the presentation draws and the
/// engine hit-tests.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding entities by name.
    pub tag: String,
    /// Whether this entity is active (inactive entities are skipped by hit-testing).
    pub active: bool,
    /// Center position in world space.
    pub pos: Vec2,
    /// Width and height in world units.
    pub size: Vec2,
    /// Stacking layer; higher layers are on top.
    pub layer: RenderLayer,
    /// Identifier this entity declares as a drop region. `None` for plain visuals.
    pub owner: Option<String>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            size: Vec2::ONE,
            layer: RenderLayer::default(),
            owner: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Whether `point` lies inside this entity's box (edges inclusive).
    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let d = (point - self.pos).abs();
        d.x <= half.x && d.y <= half.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_centered_on_pos() {
        let e = Entity::new(EntityId(1))
            .with_pos(Vec2::new(100.0, 100.0))
            .with_size(Vec2::new(40.0, 20.0));
        assert!(e.contains(Vec2::new(100.0, 100.0)));
        assert!(e.contains(Vec2::new(120.0, 110.0)));
        assert!(!e.contains(Vec2::new(121.0, 100.0)));
        assert!(!e.contains(Vec2::new(100.0, 89.0)));
    }
}
