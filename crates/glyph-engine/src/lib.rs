pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::error::LoadError;
pub use api::game::{Game, GameConfig, EngineContext};
pub use api::types::{EntityId, GameEvent, Speaker, SpeechQueue};
pub use components::entity::Entity;
pub use components::layer::RenderLayer;
pub use core::scene::{HitTest, Scene};
pub use core::time::{FixedTimestep, TimerId, TimerQueue};
pub use input::queue::{InputEvent, InputQueue};
pub use systems::rng::Rng;
