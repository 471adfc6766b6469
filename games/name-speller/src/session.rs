//! Play session: owns all mutable state of one run through a collection and
//! serializes every transition (drops, timer expiries, restart) through
//! `&mut self`.

use glam::Vec2;
use serde::Serialize;

use glyph_engine::{HitTest, Rng, Speaker, TimerId, TimerQueue};

use crate::model::{Collection, DisplayMode, Item, ItemId, ModelError, Settings};
use crate::pool::{self, GameChar, UnitId};
use crate::progress::{MatchEffect, Progress};
use crate::resolver::{resolve_drop, DropOutcome};
use crate::stage::Stage;
use crate::turn::{Ladder, ScaffoldingLevel, TurnEngine, TurnSignal};

/// Pause after an item completes before the stage moves on, single mode.
pub const SETTLE_SINGLE: f32 = 2.0;
/// Same, multi mode.
pub const SETTLE_MULTI: f32 = 1.5;
/// Delay before the item-complete announcement, so the match phrase finishes first.
pub const ANNOUNCE_DELAY: f32 = 0.8;
/// How long the success/error banner stays up.
pub const FEEDBACK_TIME: f32 = 1.5;

pub const SAY_MISMATCH: &str = "不對喔，再試試看";
pub const SAY_ALL_DONE: &str = "太棒了，全部完成了！";
pub const SAY_RESTART: &str = "重新開始";

fn say_match(glyph: char) -> String {
    format!("答對了，這是{}", glyph)
}

fn say_item_done(name: &str) -> String {
    format!("{}，完成！", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Playing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Success,
    Error,
}

/// Transient banner shown after a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: &'static str,
}

impl Feedback {
    pub const SUCCESS: Feedback = Feedback { kind: FeedbackKind::Success, message: "⭕ 答對了！" };
    pub const ERROR: Feedback = Feedback { kind: FeedbackKind::Error, message: "❌ 再試試看" };
}

/// Notifications for the presentation layer, drained each frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LockChanged(bool),
    LevelChanged(ScaffoldingLevel),
    Matched { item: ItemId, index: usize },
    Mismatched { target: ItemId },
    ItemCompleted(ItemId),
    Advanced { cursor: usize },
    SessionCompleted,
    Restarted,
    Exited,
}

#[derive(Debug, Clone, PartialEq)]
enum Timer {
    Settle { item: ItemId },
    Announce(String),
    ClearFeedback,
}

pub struct PlaySession {
    collection: Collection,
    settings: Settings,
    progress: Progress,
    stage: Stage,
    turn: TurnEngine,
    /// Time up to which the turn engine has been advanced.
    turn_clock: f64,
    timers: TimerQueue<Timer>,
    feedback: Option<Feedback>,
    feedback_timer: Option<TimerId>,
    pool: Vec<GameChar>,
    pool_generation: u32,
    rng: Rng,
    phase: SessionPhase,
    exited: bool,
    events: Vec<SessionEvent>,
}

impl PlaySession {
    /// Validate the inputs and start the first turn.
    pub fn new(collection: Collection, settings: Settings, rng: Rng) -> Result<Self, ModelError> {
        collection.validate()?;
        settings.validate()?;

        let mut session = Self {
            progress: Progress::new(&collection),
            stage: Stage::new(settings.display_mode),
            turn: TurnEngine::new(Ladder::from(&settings)),
            turn_clock: 0.0,
            timers: TimerQueue::new(),
            feedback: None,
            feedback_timer: None,
            pool: Vec::new(),
            pool_generation: 0,
            rng,
            phase: SessionPhase::Playing,
            exited: false,
            events: Vec::new(),
            collection,
            settings,
        };
        log::info!(
            "session on {:?}: {} items, {:?} mode",
            session.collection.name,
            session.collection.items.len(),
            session.settings.display_mode
        );
        session.refocus();
        Ok(session)
    }

    // ---- Event handlers ----

    /// Advance time by `dt` seconds, firing due timers one at a time.
    pub fn tick(&mut self, dt: f32, speaker: &mut dyn Speaker) {
        if self.exited {
            return;
        }
        let horizon = self.timers.now() + f64::from(dt.max(0.0));
        while let Some(timer) = self.timers.pop_due(horizon) {
            let now = self.timers.now();
            self.advance_turn_to(now, speaker);
            self.on_timer(timer, speaker);
        }
        self.timers.advance_to(horizon);
        self.advance_turn_to(horizon, speaker);
    }

    /// The student let go of `unit` at `point`.
    pub fn release<H: HitTest + ?Sized>(
        &mut self,
        unit: &UnitId,
        point: Vec2,
        hit: &H,
        speaker: &mut dyn Speaker,
    ) -> DropOutcome {
        if self.exited || self.phase == SessionPhase::Complete {
            return DropOutcome::Inert;
        }
        if self.turn.is_locked() {
            log::debug!("drop of {} suppressed by impulse lock", unit.as_str());
            return DropOutcome::Inert;
        }

        let outcome = resolve_drop(unit, point, &self.pool, &self.progress, hit);
        match &outcome {
            DropOutcome::Matched { item, index, glyph } => {
                self.on_match(item.clone(), *index, *glyph, speaker);
            }
            DropOutcome::Mismatch { target } => {
                log::info!("{} dropped on {}: mismatch", unit.as_str(), target);
                speaker.speak(SAY_MISMATCH);
                self.raise_feedback(Feedback::ERROR);
                self.events.push(SessionEvent::Mismatched { target: target.clone() });
            }
            DropOutcome::Inert | DropOutcome::Stale => {}
        }
        outcome
    }

    /// Start over from the first item with nothing filled.
    pub fn restart(&mut self, speaker: &mut dyn Speaker) {
        if self.exited {
            return;
        }
        log::info!("session restarted");
        speaker.speak(SAY_RESTART);
        self.timers.clear();
        self.turn.cancel();
        self.feedback = None;
        self.feedback_timer = None;
        self.progress.reset(&self.collection);
        self.stage.reset();
        self.phase = SessionPhase::Playing;
        self.events.push(SessionEvent::Restarted);
        self.refocus();
    }

    /// Tear the session down. Nothing fires afterwards.
    pub fn exit(&mut self) {
        if self.exited {
            return;
        }
        log::info!("session exited");
        self.timers.clear();
        self.turn.cancel();
        self.pool.clear();
        self.exited = true;
        self.events.push(SessionEvent::Exited);
    }

    // ---- Read side ----

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn is_locked(&self) -> bool {
        self.turn.is_locked()
    }

    pub fn level(&self) -> ScaffoldingLevel {
        self.turn.level()
    }

    /// Turns armed so far; one per focus change.
    pub fn turns(&self) -> u64 {
        self.turn.turns()
    }

    pub fn focus(&self) -> Option<&ItemId> {
        self.stage.focus()
    }

    pub fn cursor(&self) -> usize {
        self.stage.cursor()
    }

    pub fn visible(&self) -> Vec<&Item> {
        self.stage.visible(&self.collection)
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn pool(&self) -> &[GameChar] {
        &self.pool
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Slot of `item` that should flash, if any.
    pub fn flash_slot(&self, item: &ItemId) -> Option<usize> {
        if self.level() < ScaffoldingLevel::Visual
            || self.focus() != Some(item)
            || self.progress.is_completed(item)
        {
            return None;
        }
        self.progress.fill.first_empty(item)
    }

    /// Pool unit that should show the drag gesture, if any.
    pub fn guide_unit(&self) -> Option<&UnitId> {
        if self.level() < ScaffoldingLevel::Guide {
            return None;
        }
        let focus = self.focus()?;
        let next = self.progress.fill.first_empty(focus)?;
        self.pool
            .iter()
            .find(|u| !u.is_distractor && u.targets(focus, next))
            .map(|u| &u.id)
    }

    /// Notifications since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Internals ----

    fn advance_turn_to(&mut self, t: f64, speaker: &mut dyn Speaker) {
        let dt = t - self.turn_clock;
        self.turn_clock = t;
        for signal in self.turn.advance(dt) {
            self.on_turn_signal(signal, speaker);
        }
    }

    fn on_turn_signal(&mut self, signal: TurnSignal, speaker: &mut dyn Speaker) {
        match signal {
            TurnSignal::Unlocked { .. } => self.events.push(SessionEvent::LockChanged(false)),
            TurnSignal::Escalated { focus, level } => {
                if !self.assists(&focus) {
                    log::debug!("escalation to {:?} on {} suppressed", level, focus);
                    return;
                }
                self.events.push(SessionEvent::LevelChanged(level));
            }
            TurnSignal::HintDue { focus } => {
                if !self.assists(&focus) {
                    log::debug!("hint for {} suppressed", focus);
                    return;
                }
                match self.collection.item(&focus) {
                    Some(item) if !item.hint.is_empty() => speaker.speak(&item.hint),
                    _ => log::debug!("no hint text for {}", focus),
                }
            }
        }
    }

    /// Whether a turn signal for `focus` should still reach the student.
    /// A completed focus keeps its turn running until settle re-arms it,
    /// but nothing further is shown for it.
    fn assists(&self, focus: &ItemId) -> bool {
        self.stage.focus() == Some(focus) && !self.progress.is_completed(focus)
    }

    fn on_match(&mut self, item_id: ItemId, index: usize, glyph: char, speaker: &mut dyn Speaker) {
        let Some(item) = self.collection.item(&item_id) else {
            return;
        };
        let effect = self.progress.record_match(item, index, glyph);
        if matches!(effect, MatchEffect::AlreadyFilled | MatchEffect::OutOfRange) {
            log::debug!("match on {}[{}] ignored: {:?}", item_id, index, effect);
            return;
        }
        let name = item.name.clone();

        log::info!("{} placed in {}[{}]", glyph, item_id, index);
        speaker.speak(&say_match(glyph));
        self.raise_feedback(Feedback::SUCCESS);
        self.events.push(SessionEvent::Matched { item: item_id.clone(), index });

        if effect == MatchEffect::ItemCompleted {
            self.on_item_complete(item_id, &name);
        }
        self.refresh_pool();
    }

    fn on_item_complete(&mut self, item: ItemId, name: &str) {
        self.events.push(SessionEvent::ItemCompleted(item.clone()));
        self.timers.schedule(ANNOUNCE_DELAY, Timer::Announce(say_item_done(name)));

        let settle = match self.settings.display_mode {
            DisplayMode::Single => SETTLE_SINGLE,
            DisplayMode::Multi => SETTLE_MULTI,
        };
        self.timers.schedule(settle, Timer::Settle { item });
    }

    fn on_timer(&mut self, timer: Timer, speaker: &mut dyn Speaker) {
        match timer {
            Timer::Announce(text) => speaker.speak(&text),
            Timer::ClearFeedback => {
                self.feedback = None;
                self.feedback_timer = None;
            }
            Timer::Settle { item } => self.on_settled(item, speaker),
        }
    }

    fn on_settled(&mut self, item: ItemId, speaker: &mut dyn Speaker) {
        if self.phase == SessionPhase::Complete {
            return;
        }
        match self.settings.display_mode {
            DisplayMode::Single => {
                if self.stage.focus() != Some(&item) {
                    return;
                }
                if self.stage.advance(&self.collection) {
                    let cursor = self.stage.cursor();
                    log::info!("advancing to question {}/{}", cursor + 1, self.collection.items.len());
                    self.events.push(SessionEvent::Advanced { cursor });
                    self.refocus();
                } else {
                    self.finish(speaker);
                }
            }
            DisplayMode::Multi => {
                if self.progress.all_completed(&self.collection) {
                    self.finish(speaker);
                } else {
                    self.refocus();
                }
            }
        }
    }

    fn finish(&mut self, speaker: &mut dyn Speaker) {
        log::info!("session complete");
        self.phase = SessionPhase::Complete;
        speaker.speak(SAY_ALL_DONE);
        self.events.push(SessionEvent::SessionCompleted);
    }

    /// Re-derive focus. The turn is re-armed and the pool rebuilt only when
    /// the focus identity changed; in single mode that is also the only way
    /// the visible set changes.
    fn refocus(&mut self) {
        let Some(next) = self.stage.refocus(&self.collection, &self.progress) else {
            return;
        };
        match next {
            Some(focus) => {
                self.turn.begin(focus);
                self.events.push(SessionEvent::LockChanged(true));
            }
            None => self.turn.cancel(),
        }
        self.refresh_pool();
    }

    fn refresh_pool(&mut self) {
        self.pool_generation = self.pool_generation.wrapping_add(1);
        let visible = self.stage.visible(&self.collection);
        self.pool = pool::generate(
            &visible,
            &self.progress,
            &self.settings,
            self.pool_generation,
            &mut self.rng,
        );
    }

    fn raise_feedback(&mut self, feedback: Feedback) {
        if let Some(id) = self.feedback_timer.take() {
            self.timers.cancel(id);
        }
        self.feedback = Some(feedback);
        self.feedback_timer = Some(self.timers.schedule(FEEDBACK_TIME, Timer::ClearFeedback));
    }
}
