//! Read-only inputs to a play session: the collection being played and
//! the settings chosen when the session was assigned.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an item within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pictured person or object whose name the student spells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// URL or data URI of the picture.
    #[serde(default)]
    pub image: String,
    /// Spoken when the scaffolding ladder reaches the audio rung.
    #[serde(default)]
    pub hint: String,
}

impl Item {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_owned(),
            image: String::new(),
            hint: String::new(),
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = hint.to_owned();
        self
    }

    /// Number of slots in the item's drop zone.
    pub fn slot_count(&self) -> usize {
        self.name.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
}

impl Collection {
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    /// Reject collections a session cannot be played with.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.items.is_empty() {
            return Err(ModelError::EmptyCollection(self.id.clone()));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(ModelError::EmptyName(item.id.clone()));
            }
            if !seen.insert(&item.id) {
                return Err(ModelError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(())
    }
}

/// Single question at a time, or every item on screen at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Single,
    Multi,
}

/// Session settings. Delays are seconds after the impulse lock lifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Seconds until the next slot flashes.
    pub delay_flash: f32,
    /// Seconds until the hint is spoken.
    pub delay_hint: f32,
    /// Seconds until the gesture guide appears.
    pub delay_guide: f32,
    /// Seconds of impulse-control lock at the start of every turn.
    pub impulse_time: f32,
    pub show_distractors: bool,
    pub display_mode: DisplayMode,
}

pub const DEFAULT_SETTINGS: Settings = Settings {
    delay_flash: 5.0,
    delay_hint: 10.0,
    delay_guide: 15.0,
    impulse_time: 1.5,
    show_distractors: false,
    display_mode: DisplayMode::Single,
};

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS
    }
}

impl Settings {
    /// Delays must be finite and non-negative. Their relative order is not
    /// checked: thresholds are honored as configured.
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("delayFlash", self.delay_flash),
            ("delayHint", self.delay_hint),
            ("delayGuide", self.delay_guide),
            ("impulseTime", self.impulse_time),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::BadDelay { field, value });
            }
        }
        Ok(())
    }

    pub fn is_multi(&self) -> bool {
        self.display_mode == DisplayMode::Multi
    }
}

/// JSON payload the host page hands over when a session starts.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    pub collection: Collection,
    #[serde(default)]
    pub settings: Settings,
    /// Seed for pool shuffling and distractor choice.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SessionPayload {
    pub fn parse(json: &str) -> Result<Self, ModelError> {
        let payload: SessionPayload = serde_json::from_str(json)?;
        payload.collection.validate()?;
        payload.settings.validate()?;
        Ok(payload)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("collection {0:?} has no items")]
    EmptyCollection(String),
    #[error("item {0} has an empty name")]
    EmptyName(ItemId),
    #[error("item id {0} appears more than once")]
    DuplicateItem(ItemId),
    #[error("{field} must be a non-negative number of seconds, got {value}")]
    BadDelay { field: &'static str, value: f32 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(items: Vec<Item>) -> Collection {
        Collection { id: "c1".into(), name: "班上同學".into(), items }
    }

    #[test]
    fn slots_count_chars_not_bytes() {
        let item = Item::new("p1", "小明");
        assert_eq!(item.slot_count(), 2);
    }

    #[test]
    fn empty_names_are_rejected() {
        let c = collection(vec![Item::new("p1", "小明"), Item::new("p2", "")]);
        assert!(matches!(c.validate(), Err(ModelError::EmptyName(id)) if id.as_str() == "p2"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let c = collection(vec![Item::new("p1", "小明"), Item::new("p1", "阿華")]);
        assert!(matches!(c.validate(), Err(ModelError::DuplicateItem(_))));
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert!(matches!(collection(vec![]).validate(), Err(ModelError::EmptyCollection(_))));
    }

    #[test]
    fn settings_parse_camel_case_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"delayHint": 3, "displayMode": "multi"}"#).unwrap();
        assert_eq!(s.delay_hint, 3.0);
        assert_eq!(s.delay_flash, DEFAULT_SETTINGS.delay_flash);
        assert!(s.is_multi());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn out_of_order_delays_are_allowed() {
        let s = Settings { delay_flash: 8.0, delay_hint: 2.0, ..Settings::default() };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let s = Settings { impulse_time: -1.0, ..Settings::default() };
        assert!(matches!(s.validate(), Err(ModelError::BadDelay { field: "impulseTime", .. })));
    }

    #[test]
    fn payload_parses_and_validates() {
        let json = r#"{
            "collection": {"id": "c1", "name": "家人", "items": [
                {"id": "p1", "name": "小明", "image": "", "hint": "他是哥哥"}
            ]},
            "seed": 9
        }"#;
        let payload = SessionPayload::parse(json).unwrap();
        assert_eq!(payload.collection.items[0].hint, "他是哥哥");
        assert_eq!(payload.settings, DEFAULT_SETTINGS);
        assert_eq!(payload.seed, Some(9));

        assert!(matches!(SessionPayload::parse("{"), Err(ModelError::Json(_))));
    }
}
