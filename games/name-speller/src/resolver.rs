//! Drop resolver: turns a drag release into a match, a mismatch, or nothing.

use glam::Vec2;

use glyph_engine::HitTest;

use crate::model::ItemId;
use crate::pool::{GameChar, UnitId};
use crate::progress::Progress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drop region under the release point.
    Inert,
    /// The unit is no longer on offer or its slot was filled meanwhile.
    Stale,
    /// The unit belongs to the region's item and its slot is still empty.
    Matched { item: ItemId, index: usize, glyph: char },
    /// The region belongs to a different item (or the unit is a distractor).
    Mismatch { target: ItemId },
}

impl DropOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, DropOutcome::Matched { .. })
    }
}

/// Resolve the release of `unit` at `point`.
///
/// The topmost region that declares an owner decides the target. The unit
/// is looked up in the live pool and its slot re-checked against the live
/// fill-state, so a glyph is never consumed twice.
pub fn resolve_drop<H: HitTest + ?Sized>(
    unit: &UnitId,
    point: Vec2,
    pool: &[GameChar],
    progress: &Progress,
    hit: &H,
) -> DropOutcome {
    let Some(region) = hit.owners_at(point).first().map(|s| s.to_string()) else {
        return DropOutcome::Inert;
    };
    let Some(dragged) = pool.iter().find(|u| &u.id == unit) else {
        log::debug!("drop of {} ignored: not in the live pool", unit.as_str());
        return DropOutcome::Stale;
    };

    match (&dragged.owner, dragged.target) {
        (Some(owner), Some(index)) if owner.as_str() == region => {
            if progress.is_completed(owner) || progress.fill.is_filled(owner, index) {
                return DropOutcome::Stale;
            }
            DropOutcome::Matched {
                item: owner.clone(),
                index,
                glyph: dragged.glyph,
            }
        }
        _ => DropOutcome::Mismatch { target: ItemId(region) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_engine::{Entity, EntityId, RenderLayer, Scene};

    use crate::model::{Collection, Item};

    fn collection() -> Collection {
        Collection {
            id: "c".into(),
            name: "c".into(),
            items: vec![Item::new("a", "小明"), Item::new("b", "阿華")],
        }
    }

    fn unit(item: &str, index: usize, glyph: char) -> GameChar {
        let id = ItemId::new(item);
        GameChar {
            id: UnitId::slot(&id, index),
            glyph,
            owner: Some(id),
            target: Some(index),
            is_distractor: false,
        }
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.spawn(
            Entity::new(EntityId(1))
                .with_pos(Vec2::new(100.0, 100.0))
                .with_size(Vec2::new(100.0, 50.0))
                .with_owner("a"),
        );
        scene.spawn(
            Entity::new(EntityId(2))
                .with_pos(Vec2::new(300.0, 100.0))
                .with_size(Vec2::new(100.0, 50.0))
                .with_owner("b"),
        );
        scene
    }

    #[test]
    fn empty_space_is_inert() {
        let c = collection();
        let pool = vec![unit("a", 0, '小')];
        let out = resolve_drop(&pool[0].id, Vec2::new(700.0, 500.0), &pool, &Progress::new(&c), &scene());
        assert_eq!(out, DropOutcome::Inert);
    }

    #[test]
    fn own_region_matches() {
        let c = collection();
        let pool = vec![unit("a", 1, '明')];
        let out = resolve_drop(&pool[0].id, Vec2::new(110.0, 95.0), &pool, &Progress::new(&c), &scene());
        assert_eq!(out, DropOutcome::Matched { item: ItemId::new("a"), index: 1, glyph: '明' });
        assert!(out.is_match());
    }

    #[test]
    fn other_region_mismatches() {
        let c = collection();
        let pool = vec![unit("a", 0, '小')];
        let out = resolve_drop(&pool[0].id, Vec2::new(300.0, 100.0), &pool, &Progress::new(&c), &scene());
        assert_eq!(out, DropOutcome::Mismatch { target: ItemId::new("b") });
    }

    #[test]
    fn distractor_never_matches() {
        let c = collection();
        let pool = vec![GameChar {
            id: UnitId::distractor(0, 0),
            glyph: '小',
            owner: None,
            target: None,
            is_distractor: true,
        }];
        let out = resolve_drop(&pool[0].id, Vec2::new(100.0, 100.0), &pool, &Progress::new(&c), &scene());
        assert!(matches!(out, DropOutcome::Mismatch { .. }));
    }

    #[test]
    fn topmost_region_wins() {
        let c = collection();
        let mut scene = scene();
        scene.spawn(
            Entity::new(EntityId(3))
                .with_pos(Vec2::new(100.0, 100.0))
                .with_size(Vec2::new(20.0, 20.0))
                .with_layer(RenderLayer::UI)
                .with_owner("b"),
        );
        let pool = vec![unit("a", 0, '小')];
        let out = resolve_drop(&pool[0].id, Vec2::new(100.0, 100.0), &pool, &Progress::new(&c), &scene);
        assert_eq!(out, DropOutcome::Mismatch { target: ItemId::new("b") });
    }

    #[test]
    fn filled_slot_is_stale() {
        let c = collection();
        let mut progress = Progress::new(&c);
        progress.record_match(&c.items[0], 0, '小');
        let pool = vec![unit("a", 0, '小')];
        let out = resolve_drop(&pool[0].id, Vec2::new(100.0, 100.0), &pool, &progress, &scene());
        assert_eq!(out, DropOutcome::Stale);
    }

    #[test]
    fn unit_missing_from_live_pool_is_stale() {
        let c = collection();
        let gone = UnitId::slot(&ItemId::new("a"), 0);
        let out = resolve_drop(&gone, Vec2::new(100.0, 100.0), &[], &Progress::new(&c), &scene());
        assert_eq!(out, DropOutcome::Stale);
    }
}
