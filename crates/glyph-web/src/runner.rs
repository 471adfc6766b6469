use glyph_engine::{
    EngineContext, FixedTimestep, Game, GameConfig, InputEvent, InputQueue, LoadError,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        Self {
            timestep: FixedTimestep::new(config.fixed_dt),
            ctx: EngineContext::from_config(&config),
            input: InputQueue::new(),
            game,
            config,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        self.initialized = true;
    }

    /// Hand a JSON payload from the host page to the game.
    pub fn load(&mut self, json: &str) -> Result<(), LoadError> {
        self.game.load(&mut self.ctx, json)
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame tick: clear last frame's events, run the fixed steps, drain input.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        let steps = self.timestep.accumulate(dt);
        for step in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            // Input is delivered to the first fixed step only.
            if step == 0 {
                self.input.drain();
            }
        }
    }

    /// Presentation state as JSON.
    pub fn snapshot_json(&self) -> String {
        self.game.snapshot().to_string()
    }

    /// Queued utterances as a JSON array of strings. Drains the queue.
    pub fn take_speech_json(&mut self) -> String {
        serde_json::Value::from(self.ctx.speech.drain()).to_string()
    }

    // ---- Pointer accessors for flat buffer reads ----

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    pub fn max_events(&self) -> u32 {
        self.config.max_events as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_engine::{GameEvent, Speaker};

    struct Counter {
        updates: u32,
        pointer_events: usize,
    }

    impl Game for Counter {
        fn init(&mut self, ctx: &mut EngineContext) {
            ctx.speech.speak("ready");
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.updates += 1;
            self.pointer_events += input.iter().filter(|e| e.pointer_pos().is_some()).count();
            ctx.emit_event(GameEvent::signal(self.updates as f32));
        }

        fn snapshot(&self) -> serde_json::Value {
            serde_json::json!({ "updates": self.updates })
        }
    }

    fn runner() -> GameRunner<Counter> {
        GameRunner::new(Counter { updates: 0, pointer_events: 0 })
    }

    #[test]
    fn tick_before_init_is_inert() {
        let mut r = runner();
        r.tick(1.0);
        assert_eq!(r.snapshot_json(), r#"{"updates":0}"#);
    }

    #[test]
    fn input_reaches_exactly_one_step() {
        let mut r = runner();
        r.init();
        r.push_input(InputEvent::PointerDown { x: 1.0, y: 1.0 });
        r.tick(3.0 / 60.0 + 0.001);
        assert_eq!(r.game.updates, 3);
        assert_eq!(r.game.pointer_events, 1);
        assert_eq!(r.game_events_len(), 3);
    }

    #[test]
    fn speech_drains_as_json() {
        let mut r = runner();
        r.init();
        assert_eq!(r.take_speech_json(), r#"["ready"]"#);
        assert_eq!(r.take_speech_json(), "[]");
    }

    #[test]
    fn load_defaults_to_unsupported() {
        let mut r = runner();
        assert!(matches!(r.load("{}"), Err(LoadError::Unsupported)));
    }
}
