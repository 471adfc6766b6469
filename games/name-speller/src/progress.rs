//! Fill-state store and completion tracking.
//!
//! Only [`Progress::record_match`] and [`Progress::reset`] mutate either
//! map; everyone else reads.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Collection, Item, ItemId};

/// Per-item slots, one per glyph of the item's name. `None` is empty.
///
/// Slot vectors are created at their item's name length and never resized;
/// a filled slot is only cleared by [`Progress::reset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FillState {
    slots: BTreeMap<ItemId, Vec<Option<char>>>,
}

impl FillState {
    pub fn new(collection: &Collection) -> Self {
        let slots = collection
            .items
            .iter()
            .map(|item| (item.id.clone(), vec![None; item.slot_count()]))
            .collect();
        Self { slots }
    }

    pub fn slots(&self, item: &ItemId) -> Option<&[Option<char>]> {
        self.slots.get(item).map(Vec::as_slice)
    }

    pub fn is_filled(&self, item: &ItemId, index: usize) -> bool {
        matches!(self.slots.get(item).and_then(|s| s.get(index)), Some(Some(_)))
    }

    /// First unfilled slot, the target of flash and guide hints.
    pub fn first_empty(&self, item: &ItemId) -> Option<usize> {
        self.slots.get(item)?.iter().position(Option::is_none)
    }

    pub fn is_complete(&self, item: &ItemId) -> bool {
        self.slots
            .get(item)
            .is_some_and(|s| s.iter().all(Option::is_some))
    }
}

/// Items whose every slot is filled. Grows within a session.
pub type CompletedItems = BTreeSet<ItemId>;

/// What a validated match did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEffect {
    /// The slot was empty and now holds the glyph.
    Filled,
    /// The fill completed the item; it has just entered the completed set.
    ItemCompleted,
    /// The slot was already filled (a stale or doubled drop). Nothing changed.
    AlreadyFilled,
    /// The index does not exist for this item. Nothing changed.
    OutOfRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub fill: FillState,
    pub completed: CompletedItems,
}

impl Progress {
    pub fn new(collection: &Collection) -> Self {
        Self {
            fill: FillState::new(collection),
            completed: CompletedItems::new(),
        }
    }

    /// Everything back to empty.
    pub fn reset(&mut self, collection: &Collection) {
        *self = Self::new(collection);
    }

    pub fn is_completed(&self, item: &ItemId) -> bool {
        self.completed.contains(item)
    }

    pub fn all_completed(&self, collection: &Collection) -> bool {
        collection.items.iter().all(|i| self.completed.contains(&i.id))
    }

    /// Commit a validated match of `glyph` into slot `index` of `item`, then
    /// re-check the item against the committed state.
    pub fn record_match(&mut self, item: &Item, index: usize, glyph: char) -> MatchEffect {
        let Some(slots) = self.fill.slots.get_mut(&item.id) else {
            return MatchEffect::OutOfRange;
        };
        match slots.get_mut(index) {
            None => return MatchEffect::OutOfRange,
            Some(Some(_)) => return MatchEffect::AlreadyFilled,
            Some(slot) => *slot = Some(glyph),
        }

        if self.fill.is_complete(&item.id) && self.completed.insert(item.id.clone()) {
            log::info!("item {} completed", item.id);
            return MatchEffect::ItemCompleted;
        }
        MatchEffect::Filled
    }
}
