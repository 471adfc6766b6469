//! Character pool: the draggable glyph units currently on offer.
//!
//! The pool is a pure function of what is visible and what is already
//! solved. It is rebuilt from scratch whenever those change, never patched.

use serde::Serialize;

use glyph_engine::Rng;

use crate::model::{DisplayMode, Item, ItemId, Settings};
use crate::progress::Progress;

/// Neutral filler vocabulary for distractor units.
pub const DISTRACTOR_GLYPHS: [char; 10] = ['大', '小', '美', '阿', '華', '莉', '老', '師', '爸', '媽'];

/// Identifier of a pool unit, unique within one pool generation.
///
/// Slot units are named after the slot they fill, so a drag that began on
/// an earlier generation still names the same slot when it lands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn slot(item: &ItemId, index: usize) -> Self {
        Self(format!("{}-char-{}", item, index))
    }

    pub fn distractor(generation: u32, n: usize) -> Self {
        Self(format!("distractor-{}-{}", generation, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One draggable glyph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameChar {
    pub id: UnitId,
    pub glyph: char,
    /// Item this unit completes. `None` for distractors, which never match.
    pub owner: Option<ItemId>,
    /// Slot index within the owner's name. `None` for distractors.
    pub target: Option<usize>,
    pub is_distractor: bool,
}

impl GameChar {
    /// Whether this unit fills `(item, index)`.
    pub fn targets(&self, item: &ItemId, index: usize) -> bool {
        self.owner.as_ref() == Some(item) && self.target == Some(index)
    }
}

/// Number of distractors injected for a display mode.
pub fn distractor_count(mode: DisplayMode) -> usize {
    match mode {
        DisplayMode::Single => 2,
        DisplayMode::Multi => 4,
    }
}

/// Build a fresh, shuffled pool for the visible items.
///
/// One unit per unfilled slot of every visible, not-yet-completed item,
/// plus distractors when enabled. `generation` keeps distractor ids
/// distinct across rebuilds.
pub fn generate(
    visible: &[&Item],
    progress: &Progress,
    settings: &Settings,
    generation: u32,
    rng: &mut Rng,
) -> Vec<GameChar> {
    let mut pool = Vec::new();

    for item in visible.iter().filter(|i| !progress.is_completed(&i.id)) {
        for (index, glyph) in item.name.chars().enumerate() {
            if progress.fill.is_filled(&item.id, index) {
                continue;
            }
            pool.push(GameChar {
                id: UnitId::slot(&item.id, index),
                glyph,
                owner: Some(item.id.clone()),
                target: Some(index),
                is_distractor: false,
            });
        }
    }

    if settings.show_distractors {
        for n in 0..distractor_count(settings.display_mode) {
            let glyph = rng.pick(&DISTRACTOR_GLYPHS).copied().unwrap_or('大');
            pool.push(GameChar {
                id: UnitId::distractor(generation, n),
                glyph,
                owner: None,
                target: None,
                is_distractor: true,
            });
        }
    }

    rng.shuffle(&mut pool);
    pool
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::Collection;

    fn collection() -> Collection {
        Collection {
            id: "c".into(),
            name: "c".into(),
            items: vec![Item::new("p1", "小明"), Item::new("p2", "王大同")],
        }
    }

    #[test]
    fn one_unit_per_unfilled_slot() {
        let c = collection();
        let mut progress = Progress::new(&c);
        progress.record_match(&c.items[1], 1, '大');
        let visible: Vec<&Item> = c.items.iter().collect();
        let pool = generate(&visible, &progress, &Settings::default(), 0, &mut Rng::new(1));

        assert_eq!(pool.len(), 4);
        assert!(!pool.iter().any(|u| u.targets(&c.items[1].id, 1)));
        let targets: HashSet<_> = pool.iter().map(|u| (u.owner.clone(), u.target)).collect();
        assert_eq!(targets.len(), pool.len());
    }

    #[test]
    fn completed_items_contribute_nothing() {
        let c = collection();
        let mut progress = Progress::new(&c);
        progress.record_match(&c.items[0], 0, '小');
        progress.record_match(&c.items[0], 1, '明');
        let visible: Vec<&Item> = c.items.iter().collect();
        let pool = generate(&visible, &progress, &Settings::default(), 0, &mut Rng::new(1));
        assert!(pool.iter().all(|u| u.owner.as_ref() == Some(&c.items[1].id)));
    }

    #[test]
    fn distractors_follow_display_mode() {
        let c = collection();
        let progress = Progress::new(&c);
        let single = Settings { show_distractors: true, ..Settings::default() };
        let multi = Settings { display_mode: DisplayMode::Multi, ..single.clone() };

        let one = [&c.items[0]];
        let pool = generate(&one, &progress, &single, 3, &mut Rng::new(5));
        assert_eq!(pool.len(), 2 + 2);

        let all: Vec<&Item> = c.items.iter().collect();
        let pool = generate(&all, &progress, &multi, 3, &mut Rng::new(5));
        assert_eq!(pool.len(), 5 + 4);

        for unit in pool.iter().filter(|u| u.is_distractor) {
            assert!(unit.owner.is_none());
            assert!(unit.target.is_none());
            assert!(DISTRACTOR_GLYPHS.contains(&unit.glyph));
        }
    }

    #[test]
    fn same_seed_same_pool() {
        let c = collection();
        let progress = Progress::new(&c);
        let settings = Settings { show_distractors: true, ..Settings::default() };
        let visible: Vec<&Item> = c.items.iter().collect();
        let a = generate(&visible, &progress, &settings, 0, &mut Rng::new(11));
        let b = generate(&visible, &progress, &settings, 0, &mut Rng::new(11));
        assert_eq!(a, b);
    }

    #[test]
    fn slot_ids_are_stable_across_generations() {
        let id = ItemId::new("p1");
        assert_eq!(UnitId::slot(&id, 1).as_str(), "p1-char-1");
        assert_ne!(UnitId::distractor(1, 0), UnitId::distractor(2, 0));
    }
}
