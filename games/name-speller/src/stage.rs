//! Stage controller: which items are on screen and which one scaffolding targets.

use crate::model::{Collection, DisplayMode, Item, ItemId};
use crate::progress::Progress;

#[derive(Debug, Clone)]
pub struct Stage {
    mode: DisplayMode,
    cursor: usize,
    focus: Option<ItemId>,
}

impl Stage {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            cursor: 0,
            focus: None,
        }
    }

    /// Index of the current question in single mode.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Item scaffolding currently targets, as of the last refocus.
    pub fn focus(&self) -> Option<&ItemId> {
        self.focus.as_ref()
    }

    /// Items on screen: every item in multi mode, the cursor's item in single mode.
    pub fn visible<'a>(&self, collection: &'a Collection) -> Vec<&'a Item> {
        match self.mode {
            DisplayMode::Multi => collection.items.iter().collect(),
            DisplayMode::Single => collection.items.get(self.cursor).into_iter().collect(),
        }
    }

    /// Which item should have focus given the current progress.
    pub fn derive_focus(&self, collection: &Collection, progress: &Progress) -> Option<ItemId> {
        match self.mode {
            DisplayMode::Single => collection.items.get(self.cursor).map(|i| i.id.clone()),
            DisplayMode::Multi => collection
                .items
                .iter()
                .find(|i| !progress.is_completed(&i.id))
                .map(|i| i.id.clone()),
        }
    }

    /// Recompute focus. Returns the new focus only when its identity changed,
    /// which is the one thing that should re-arm the turn engine.
    pub fn refocus(&mut self, collection: &Collection, progress: &Progress) -> Option<Option<ItemId>> {
        let next = self.derive_focus(collection, progress);
        if next == self.focus {
            return None;
        }
        log::debug!("focus {:?} -> {:?}", self.focus, next);
        self.focus = next.clone();
        Some(next)
    }

    /// Whether single mode has a question after the current one.
    pub fn has_next(&self, collection: &Collection) -> bool {
        self.cursor + 1 < collection.items.len()
    }

    /// Move the single-mode cursor forward. Returns false at the last item.
    pub fn advance(&mut self, collection: &Collection) -> bool {
        if !self.has_next(collection) {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Back to the first item with no focus.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.focus = None;
    }
}
