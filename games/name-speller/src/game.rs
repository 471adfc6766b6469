use glam::Vec2;
use glyph_engine::*;
use serde::Serialize;

use crate::model::{DisplayMode, ItemId, ModelError, SessionPayload};
use crate::pool::{GameChar, UnitId};
use crate::session::{Feedback, PlaySession, SessionEvent, SessionPhase};
use crate::turn::ScaffoldingLevel;

const WORLD_WIDTH: f32 = 800.0;
const WORLD_HEIGHT: f32 = 600.0;
const FIXED_DT: f32 = 1.0 / 60.0;

// Drop-zone layout
const CARD_SINGLE: Vec2 = Vec2::new(360.0, 220.0);
const GRID_COLUMNS: usize = 3;
const CARD_WIDTH: f32 = 230.0;
const CARD_GAP: f32 = 20.0;
const ZONE_TOP: f32 = 30.0;
const ZONE_BOTTOM: f32 = 420.0;

// Tile tray
const TILE_SIZE: f32 = 64.0;
const TILE_GAP: f32 = 12.0;
const TRAY_COLUMNS: usize = 10;
const TRAY_TOP: f32 = 440.0;

// Game event kinds (Rust → host page)
const EVENT_LOCK: f32 = 1.0;
const EVENT_LEVEL: f32 = 2.0;
const EVENT_MATCH: f32 = 3.0;
const EVENT_MISMATCH: f32 = 4.0;
const EVENT_ITEM_COMPLETE: f32 = 5.0;
const EVENT_ADVANCED: f32 = 6.0;
const EVENT_SESSION_COMPLETE: f32 = 7.0;
const EVENT_RESTARTED: f32 = 8.0;
const EVENT_EXIT: f32 = 9.0;

// Custom event kinds (host page → Rust)
const CUSTOM_RESTART: u32 = glyph_web::custom::RESTART;
const CUSTOM_EXIT: u32 = glyph_web::custom::EXIT;

impl From<ModelError> for LoadError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Json(e) => LoadError::Parse(e),
            other => LoadError::Invalid(other.to_string()),
        }
    }
}

/// A glyph tile following the pointer.
#[derive(Debug, Clone)]
struct Drag {
    unit: UnitId,
    /// Tile center minus the pointer position at grab time.
    offset: Vec2,
    pos: Vec2,
}

pub struct NameSpeller {
    session: Option<PlaySession>,
    drag: Option<Drag>,
}

impl NameSpeller {
    pub fn new() -> Self {
        Self {
            session: None,
            drag: None,
        }
    }

    pub fn session(&self) -> Option<&PlaySession> {
        self.session.as_ref()
    }

    /// World-space rectangle (center, size) of each visible item's drop zone.
    fn zone_layout(mode: DisplayMode, count: usize) -> Vec<(Vec2, Vec2)> {
        match mode {
            DisplayMode::Single => {
                let center = Vec2::new(WORLD_WIDTH / 2.0, (ZONE_TOP + ZONE_BOTTOM) / 2.0);
                (0..count.min(1)).map(|_| (center, CARD_SINGLE)).collect()
            }
            DisplayMode::Multi => {
                let rows = count.div_ceil(GRID_COLUMNS).max(1);
                let row_h = (ZONE_BOTTOM - ZONE_TOP) / rows as f32;
                let size = Vec2::new(CARD_WIDTH, row_h - CARD_GAP);
                (0..count)
                    .map(|i| {
                        let (row, col) = (i / GRID_COLUMNS, i % GRID_COLUMNS);
                        let in_row = (count - row * GRID_COLUMNS).min(GRID_COLUMNS);
                        let row_w = in_row as f32 * (CARD_WIDTH + CARD_GAP) - CARD_GAP;
                        let left = (WORLD_WIDTH - row_w) / 2.0;
                        let center = Vec2::new(
                            left + col as f32 * (CARD_WIDTH + CARD_GAP) + CARD_WIDTH * 0.5,
                            ZONE_TOP + row as f32 * row_h + row_h * 0.5,
                        );
                        (center, size)
                    })
                    .collect()
            }
        }
    }

    /// Resting center of the `i`-th tile in a tray of `count`.
    fn tray_slot(i: usize, count: usize) -> Vec2 {
        let (row, col) = (i / TRAY_COLUMNS, i % TRAY_COLUMNS);
        let in_row = (count - row * TRAY_COLUMNS).min(TRAY_COLUMNS);
        let row_w = in_row as f32 * (TILE_SIZE + TILE_GAP) - TILE_GAP;
        let left = (WORLD_WIDTH - row_w) / 2.0;
        Vec2::new(
            left + col as f32 * (TILE_SIZE + TILE_GAP) + TILE_SIZE * 0.5,
            TRAY_TOP + row as f32 * (TILE_SIZE + TILE_GAP) + TILE_SIZE * 0.5,
        )
    }

    /// Topmost pool tile under `point`.
    fn tile_at(scene: &Scene, point: Vec2) -> Option<(UnitId, Vec2)> {
        scene
            .entities_at(point)
            .into_iter()
            .find(|e| e.layer == RenderLayer::UI && !e.tag.is_empty())
            .map(|e| (UnitId(e.tag.clone()), e.pos))
    }

    fn handle_input(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        for (kind, _, _, _) in input.customs() {
            match kind {
                CUSTOM_RESTART => {
                    self.drag = None;
                    session.restart(&mut ctx.speech);
                }
                CUSTOM_EXIT => {
                    self.drag = None;
                    session.exit();
                }
                other => log::debug!("ignoring custom event {}", other),
            }
        }

        for event in input.iter() {
            match *event {
                InputEvent::PointerDown { x, y } => {
                    if session.is_locked()
                        || session.is_exited()
                        || session.phase() == SessionPhase::Complete
                    {
                        continue;
                    }
                    let p = Vec2::new(x, y);
                    if let Some((unit, center)) = Self::tile_at(&ctx.scene, p) {
                        log::debug!("grabbed {}", unit.as_str());
                        self.drag = Some(Drag { unit, offset: center - p, pos: center });
                    }
                }
                InputEvent::PointerMove { x, y } => {
                    if let Some(drag) = self.drag.as_mut() {
                        drag.pos = Vec2::new(x, y) + drag.offset;
                    }
                }
                InputEvent::PointerUp { x, y } | InputEvent::PointerCancel { x, y } => {
                    if let Some(drag) = self.drag.take() {
                        let center = Vec2::new(x, y) + drag.offset;
                        session.release(&drag.unit, center, &ctx.scene, &mut ctx.speech);
                    }
                }
                InputEvent::Custom { .. } => {}
            }
        }
    }

    fn forward_events(session: &mut PlaySession, ctx: &mut EngineContext) {
        fn position(session: &PlaySession, id: &ItemId) -> f32 {
            session.collection().position(id).map_or(-1.0, |p| p as f32)
        }
        for event in session.take_events() {
            let out = match &event {
                SessionEvent::LockChanged(locked) => {
                    GameEvent::new(EVENT_LOCK, if *locked { 1.0 } else { 0.0 }, 0.0, 0.0)
                }
                SessionEvent::LevelChanged(level) => GameEvent::new(EVENT_LEVEL, level.as_f32(), 0.0, 0.0),
                SessionEvent::Matched { item, index } => {
                    GameEvent::new(EVENT_MATCH, position(session, item), *index as f32, 0.0)
                }
                SessionEvent::Mismatched { target } => {
                    GameEvent::new(EVENT_MISMATCH, position(session, target), 0.0, 0.0)
                }
                SessionEvent::ItemCompleted(item) => {
                    GameEvent::new(EVENT_ITEM_COMPLETE, position(session, item), 0.0, 0.0)
                }
                SessionEvent::Advanced { cursor } => GameEvent::new(EVENT_ADVANCED, *cursor as f32, 0.0, 0.0),
                SessionEvent::SessionCompleted => GameEvent::signal(EVENT_SESSION_COMPLETE),
                SessionEvent::Restarted => GameEvent::signal(EVENT_RESTARTED),
                SessionEvent::Exited => GameEvent::signal(EVENT_EXIT),
            };
            ctx.emit_event(out);
        }
    }

    /// Rebuild drop zones and pool tiles from session state.
    fn sync_entities(&self, ctx: &mut EngineContext) {
        ctx.scene.clear();
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.is_exited() {
            return;
        }

        let visible = session.visible();
        let zones = Self::zone_layout(session.settings().display_mode, visible.len());
        for (item, (center, size)) in visible.iter().zip(zones) {
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag(format!("zone:{}", item.id))
                    .with_pos(center)
                    .with_size(size)
                    .with_layer(RenderLayer::Terrain)
                    .with_owner(item.id.as_str()),
            );
        }

        // Tiles are hidden during the impulse lock.
        if session.is_locked() {
            return;
        }
        let pool = session.pool();
        for (i, unit) in pool.iter().enumerate() {
            let pos = match &self.drag {
                Some(drag) if drag.unit == unit.id => drag.pos,
                _ => Self::tray_slot(i, pool.len()),
            };
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_tag(unit.id.as_str())
                    .with_pos(pos)
                    .with_size(Vec2::splat(TILE_SIZE))
                    .with_layer(RenderLayer::UI),
            );
        }
    }
}

impl Default for NameSpeller {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for NameSpeller {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            ..GameConfig::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        ctx.scene.clear();
        log::info!("name speller ready, waiting for a collection");
    }

    fn load(&mut self, ctx: &mut EngineContext, json: &str) -> Result<(), LoadError> {
        let payload = SessionPayload::parse(json)?;
        let seed = payload.seed.unwrap_or_else(|| ctx.rng.next_u64());
        let session = PlaySession::new(payload.collection, payload.settings, Rng::new(seed))?;
        self.session = Some(session);
        self.drag = None;
        if let Some(session) = self.session.as_mut() {
            Self::forward_events(session, ctx);
        }
        self.sync_entities(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        self.handle_input(ctx, input);

        if let Some(session) = self.session.as_mut() {
            session.tick(FIXED_DT, &mut ctx.speech);
            Self::forward_events(session, ctx);

            // The dragged unit may have left the pool (restart, completion).
            let stale = self
                .drag
                .as_ref()
                .is_some_and(|d| session.is_locked() || !session.pool().iter().any(|u| u.id == d.unit));
            if stale {
                self.drag = None;
            }
        }

        self.sync_entities(ctx);
    }

    fn snapshot(&self) -> serde_json::Value {
        let Some(session) = self.session.as_ref() else {
            return serde_json::json!({ "loaded": false });
        };
        let view = SnapshotView::new(session, &self.drag);
        serde_json::to_value(view).unwrap_or(serde_json::Value::Null)
    }
}

// ---- Presentation view ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemView<'a> {
    id: &'a ItemId,
    name: &'a str,
    image: &'a str,
    slots: &'a [Option<char>],
    completed: bool,
    flash_slot: Option<usize>,
    zone: [f32; 4],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileView<'a> {
    #[serde(flatten)]
    unit: &'a GameChar,
    x: f32,
    y: f32,
    dragging: bool,
    guided: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotView<'a> {
    loaded: bool,
    phase: SessionPhase,
    exited: bool,
    locked: bool,
    level: ScaffoldingLevel,
    focus: Option<&'a ItemId>,
    items: Vec<ItemView<'a>>,
    pool: Vec<TileView<'a>>,
    guide_unit: Option<&'a UnitId>,
    feedback: Option<Feedback>,
    current: usize,
    total: usize,
    completed_count: usize,
}

impl<'a> SnapshotView<'a> {
    fn new(session: &'a PlaySession, drag: &Option<Drag>) -> Self {
        let visible = session.visible();
        let zones = NameSpeller::zone_layout(session.settings().display_mode, visible.len());
        let items = visible
            .into_iter()
            .zip(zones)
            .map(|(item, (center, size))| ItemView {
                id: &item.id,
                name: &item.name,
                image: &item.image,
                slots: session.progress().fill.slots(&item.id).unwrap_or(&[]),
                completed: session.progress().is_completed(&item.id),
                flash_slot: session.flash_slot(&item.id),
                zone: [center.x, center.y, size.x, size.y],
            })
            .collect();

        let guide_unit = session.guide_unit();
        let pool: Vec<TileView<'a>> = if session.is_locked() {
            Vec::new()
        } else {
            let units = session.pool();
            units
                .iter()
                .enumerate()
                .map(|(i, unit)| {
                    let dragged = drag.as_ref().filter(|d| d.unit == unit.id);
                    let pos = dragged.map_or_else(|| NameSpeller::tray_slot(i, units.len()), |d| d.pos);
                    TileView {
                        unit,
                        x: pos.x,
                        y: pos.y,
                        dragging: dragged.is_some(),
                        guided: guide_unit == Some(&unit.id),
                    }
                })
                .collect()
        };

        let total = session.collection().items.len();
        Self {
            loaded: true,
            phase: session.phase(),
            exited: session.is_exited(),
            locked: session.is_locked(),
            level: session.level(),
            focus: session.focus(),
            items,
            pool,
            guide_unit,
            feedback: session.feedback(),
            current: match session.settings().display_mode {
                DisplayMode::Single => (session.cursor() + 1).min(total),
                DisplayMode::Multi => session.progress().completed.len(),
            },
            total,
            completed_count: session.progress().completed.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "collection": {
            "id": "fam",
            "name": "家人",
            "items": [
                { "id": "p1", "name": "小明", "hint": "這是小明" },
                { "id": "p2", "name": "阿華" }
            ]
        },
        "settings": { "impulseTime": 1, "delayFlash": 5, "delayHint": 10, "delayGuide": 15 },
        "seed": 3
    }"#;

    fn loaded() -> (NameSpeller, EngineContext) {
        let mut game = NameSpeller::new();
        let mut ctx = EngineContext::from_config(&game.config());
        game.init(&mut ctx);
        game.load(&mut ctx, PAYLOAD).unwrap();
        (game, ctx)
    }

    fn step(game: &mut NameSpeller, ctx: &mut EngineContext, events: &[InputEvent]) {
        let mut input = InputQueue::new();
        for e in events {
            input.push(*e);
        }
        ctx.clear_frame_data();
        game.update(ctx, &input);
    }

    fn run_for(game: &mut NameSpeller, ctx: &mut EngineContext, seconds: f32) {
        let steps = (seconds / FIXED_DT).round() as usize;
        for _ in 0..steps {
            step(game, ctx, &[]);
        }
    }

    fn tile_pos(ctx: &EngineContext, unit: &str) -> Vec2 {
        ctx.scene.find_by_tag(unit).unwrap().pos
    }

    fn zone_pos(ctx: &EngineContext, item: &str) -> Vec2 {
        ctx.scene.find_by_tag(&format!("zone:{}", item)).unwrap().pos
    }

    fn drag(game: &mut NameSpeller, ctx: &mut EngineContext, from: Vec2, to: Vec2) {
        step(
            game,
            ctx,
            &[
                InputEvent::PointerDown { x: from.x, y: from.y },
                InputEvent::PointerMove { x: to.x, y: to.y },
                InputEvent::PointerUp { x: to.x, y: to.y },
            ],
        );
    }

    #[test]
    fn load_rejects_bad_payloads() {
        let mut game = NameSpeller::new();
        let mut ctx = EngineContext::new();
        assert!(matches!(game.load(&mut ctx, "{"), Err(LoadError::Parse(_))));
        let empty = r#"{ "collection": { "id": "c", "name": "c", "items": [] } }"#;
        assert!(matches!(game.load(&mut ctx, empty), Err(LoadError::Invalid(_))));
        assert!(game.session().is_none());
    }

    #[test]
    fn single_mode_shows_one_zone_and_hides_tiles_while_locked() {
        let (game, ctx) = loaded();
        assert_eq!(ctx.scene.len(), 1);
        assert!(ctx.scene.find_by_tag("zone:p1").is_some());
        let snap = game.snapshot();
        assert_eq!(snap["locked"], true);
        assert_eq!(snap["pool"].as_array().unwrap().len(), 0);
        assert_eq!(snap["total"], 2);
    }

    #[test]
    fn dragging_a_tile_onto_its_zone_fills_the_slot() {
        let (mut game, mut ctx) = loaded();
        run_for(&mut game, &mut ctx, 1.0);
        assert!(!game.session().unwrap().is_locked());

        let from = tile_pos(&ctx, "p1-char-0");
        let to = zone_pos(&ctx, "p1");
        drag(&mut game, &mut ctx, from, to);

        let session = game.session().unwrap();
        let slots = session.progress().fill.slots(&ItemId::new("p1")).unwrap();
        assert_eq!(slots, &[Some('小'), None]);
        assert!(ctx.events.iter().any(|e| e.kind == EVENT_MATCH && e.b == 0.0));
        assert_eq!(ctx.speech.iter().last(), Some("答對了，這是小"));
        assert!(ctx.scene.find_by_tag("p1-char-0").is_none());
    }

    #[test]
    fn pointer_down_is_ignored_while_locked() {
        let (mut game, mut ctx) = loaded();
        let to = zone_pos(&ctx, "p1");
        drag(&mut game, &mut ctx, Vec2::new(400.0, 480.0), to);
        let slots = game.session().unwrap().progress().fill.slots(&ItemId::new("p1")).unwrap();
        assert_eq!(slots, &[None::<char>, None]);
    }

    #[test]
    fn dropping_in_the_tray_returns_the_tile() {
        let (mut game, mut ctx) = loaded();
        run_for(&mut game, &mut ctx, 1.0);
        let from = tile_pos(&ctx, "p1-char-1");
        drag(&mut game, &mut ctx, from, Vec2::new(from.x + 5.0, from.y));
        assert!(ctx.speech.is_empty());
        step(&mut game, &mut ctx, &[]);
        assert_eq!(tile_pos(&ctx, "p1-char-1"), from);
    }

    #[test]
    fn restart_and_exit_custom_events() {
        let (mut game, mut ctx) = loaded();
        run_for(&mut game, &mut ctx, 1.0);
        let from = tile_pos(&ctx, "p1-char-0");
        let to = zone_pos(&ctx, "p1");
        drag(&mut game, &mut ctx, from, to);

        step(&mut game, &mut ctx, &[InputEvent::Custom { kind: CUSTOM_RESTART, a: 0.0, b: 0.0, c: 0.0 }]);
        let session = game.session().unwrap();
        assert_eq!(session.progress().fill.slots(&ItemId::new("p1")).unwrap(), &[None::<char>, None]);
        assert!(ctx.events.iter().any(|e| e.kind == EVENT_RESTARTED));

        step(&mut game, &mut ctx, &[InputEvent::Custom { kind: CUSTOM_EXIT, a: 0.0, b: 0.0, c: 0.0 }]);
        assert!(game.session().unwrap().is_exited());
        assert!(ctx.events.iter().any(|e| e.kind == EVENT_EXIT));
        assert!(ctx.scene.is_empty());
    }

    #[test]
    fn snapshot_reports_scaffolding() {
        let (mut game, mut ctx) = loaded();
        run_for(&mut game, &mut ctx, 16.5);
        let snap = game.snapshot();
        assert_eq!(snap["level"], "GUIDE");
        assert_eq!(snap["items"][0]["flashSlot"], 0);
        assert_eq!(snap["guideUnit"], "p1-char-0");
        let guided: Vec<_> = snap["pool"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t["guided"] == true)
            .collect();
        assert_eq!(guided.len(), 1);
        assert!(ctx.speech.iter().any(|t| t == "這是小明"));
    }

    #[test]
    fn multi_mode_lays_out_every_item() {
        let json = PAYLOAD.replace(r#""delayGuide": 15"#, r#""delayGuide": 15, "displayMode": "multi""#);
        let mut game = NameSpeller::new();
        let mut ctx = EngineContext::new();
        game.load(&mut ctx, &json).unwrap();
        assert!(ctx.scene.find_by_tag("zone:p1").is_some());
        assert!(ctx.scene.find_by_tag("zone:p2").is_some());
        let a = zone_pos(&ctx, "p1");
        let b = zone_pos(&ctx, "p2");
        assert_eq!(a.y, b.y);
        assert!(a.x < b.x);
    }
}
