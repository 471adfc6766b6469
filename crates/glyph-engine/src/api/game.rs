use crate::api::error::LoadError;
use crate::api::types::{EntityId, GameEvent, SpeechQueue};
use crate::core::scene::Scene;
use crate::input::queue::InputQueue;
use crate::systems::rng::Rng;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    /// Maximum number of queued utterances before the oldest is dropped (default: 8).
    pub max_speech: usize,
    /// Seed for the context RNG.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            max_events: 32,
            max_speech: 8,
            seed: 42,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// Accept a JSON payload from the host page (content, settings).
    fn load(&mut self, _ctx: &mut EngineContext, _json: &str) -> Result<(), LoadError> {
        Err(LoadError::Unsupported)
    }

    /// The game loop tick. Advance timers, handle input, rebuild the scene.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Presentation state for the host page to render reactively.
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub speech: SpeechQueue,
    pub events: Vec<GameEvent>,
    pub rng: Rng,
    max_events: usize,
    next_id: u32,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::from_config(&GameConfig::default())
    }

    /// Create an EngineContext sized and seeded from a game's config.
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            scene: Scene::new(),
            speech: SpeechQueue::new(config.max_speech),
            events: Vec::with_capacity(config.max_events),
            rng: Rng::new(config.seed),
            max_events: config.max_events,
            next_id: 1,
        }
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a game event to be forwarded to TypeScript.
    /// Events beyond the per-frame capacity are dropped.
    pub fn emit_event(&mut self, event: GameEvent) {
        if self.events.len() >= self.max_events {
            log::warn!("event buffer full, dropping kind={}", event.kind);
            return;
        }
        self.events.push(event);
    }

    /// Clear per-frame transient data. Speech is drained by the host, not here.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut ctx = EngineContext::new();
        let a = ctx.next_id();
        let b = ctx.next_id();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn events_are_capped_per_frame() {
        let config = GameConfig { max_events: 2, ..GameConfig::default() };
        let mut ctx = EngineContext::from_config(&config);
        for k in 0..5 {
            ctx.emit_event(GameEvent::signal(k as f32));
        }
        assert_eq!(ctx.events.len(), 2);
        ctx.clear_frame_data();
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn frame_clear_keeps_speech() {
        use crate::api::types::Speaker;
        let mut ctx = EngineContext::new();
        ctx.speech.speak("你好");
        ctx.clear_frame_data();
        assert_eq!(ctx.speech.len(), 1);
    }
}
