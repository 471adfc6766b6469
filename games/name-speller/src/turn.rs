//! Turn engine: the impulse lock and the time-based scaffolding ladder.
//!
//! A turn starts locked. Once `impulse_time` has elapsed the lock lifts and
//! a whole-second counter starts at zero; each second the engine climbs to
//! the highest rung whose threshold has been reached. Rungs are never
//! revisited or lowered within a turn.

use serde::Serialize;

use crate::model::{ItemId, Settings};

/// Slack for comparing accumulated fixed-step time against whole seconds.
const TIME_EPSILON: f64 = 1e-6;

/// Rung of the assistance ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaffoldingLevel {
    #[default]
    None = 0,
    /// The focus item's next slot flashes.
    Visual = 1,
    /// The focus item's hint is spoken.
    Audio = 2,
    /// The unit for the next slot shows a drag gesture.
    Guide = 3,
}

impl ScaffoldingLevel {
    pub fn as_f32(self) -> f32 {
        self as u8 as f32
    }
}

/// Thresholds in seconds, taken from the session settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ladder {
    pub impulse: f64,
    pub flash: f64,
    pub hint: f64,
    pub guide: f64,
}

impl From<&Settings> for Ladder {
    fn from(s: &Settings) -> Self {
        Self {
            impulse: f64::from(s.impulse_time),
            flash: f64::from(s.delay_flash),
            hint: f64::from(s.delay_hint),
            guide: f64::from(s.delay_guide),
        }
    }
}

/// Something the turn engine wants the session to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSignal {
    /// The impulse lock lifted.
    Unlocked { focus: ItemId },
    /// The ladder climbed to `level`.
    Escalated { focus: ItemId, level: ScaffoldingLevel },
    /// The hint threshold was reached; speak the focus item's hint.
    /// Fires at most once per turn.
    HintDue { focus: ItemId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Locked { remaining: f64 },
    Free { elapsed: u32, carry: f64 },
}

#[derive(Debug, Clone)]
pub struct TurnEngine {
    ladder: Ladder,
    phase: Phase,
    focus: Option<ItemId>,
    level: ScaffoldingLevel,
    hint_given: bool,
    turns: u64,
}

impl TurnEngine {
    pub fn new(ladder: Ladder) -> Self {
        Self {
            ladder,
            phase: Phase::Idle,
            focus: None,
            level: ScaffoldingLevel::None,
            hint_given: false,
            turns: 0,
        }
    }

    /// Arm a new turn for `focus`, cancelling whatever was running.
    pub fn begin(&mut self, focus: ItemId) {
        self.cancel();
        log::debug!("turn {} begins on {}", self.turns + 1, focus);
        self.turns += 1;
        self.focus = Some(focus);
        self.phase = Phase::Locked { remaining: self.ladder.impulse };
    }

    /// End the current turn. Safe to call when no turn is running.
    pub fn cancel(&mut self) {
        if let Some(focus) = self.focus.take() {
            log::debug!("turn {} on {} cancelled at {:?}", self.turns, focus, self.level);
        }
        self.phase = Phase::Idle;
        self.level = ScaffoldingLevel::None;
        self.hint_given = false;
    }

    /// Input is suppressed while this is true.
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, Phase::Locked { .. })
    }

    pub fn level(&self) -> ScaffoldingLevel {
        self.level
    }

    pub fn focus(&self) -> Option<&ItemId> {
        self.focus.as_ref()
    }

    /// Number of turns armed since creation.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Whole seconds since the lock lifted, if it has.
    pub fn elapsed(&self) -> Option<u32> {
        match self.phase {
            Phase::Free { elapsed, .. } => Some(elapsed),
            _ => None,
        }
    }

    /// Advance the turn clock by `dt` seconds, returning signals in the
    /// order they occurred.
    pub fn advance(&mut self, dt: f64) -> Vec<TurnSignal> {
        let mut signals = Vec::new();
        let Some(focus) = self.focus.clone() else {
            return signals;
        };
        let mut left = dt.max(0.0);

        loop {
            match self.phase {
                Phase::Idle => break,
                Phase::Locked { remaining } => {
                    if left + TIME_EPSILON < remaining {
                        self.phase = Phase::Locked { remaining: remaining - left };
                        break;
                    }
                    left = (left - remaining).max(0.0);
                    self.phase = Phase::Free { elapsed: 0, carry: 0.0 };
                    log::debug!("impulse lock lifted on {}", focus);
                    signals.push(TurnSignal::Unlocked { focus: focus.clone() });
                    self.reach(0, &focus, &mut signals);
                }
                Phase::Free { mut elapsed, mut carry } => {
                    carry += left;
                    while carry + TIME_EPSILON >= 1.0 {
                        carry = (carry - 1.0).max(0.0);
                        elapsed += 1;
                        self.reach(elapsed, &focus, &mut signals);
                    }
                    self.phase = Phase::Free { elapsed, carry };
                    break;
                }
            }
        }
        signals
    }

    /// Climb to the highest rung whose threshold `elapsed` has reached.
    fn reach(&mut self, elapsed: u32, focus: &ItemId, signals: &mut Vec<TurnSignal>) {
        let secs = f64::from(elapsed);
        let mut target = self.level;
        if secs >= self.ladder.flash {
            target = target.max(ScaffoldingLevel::Visual);
        }
        let hint_now = secs >= self.ladder.hint && !self.hint_given;
        if secs >= self.ladder.hint {
            target = target.max(ScaffoldingLevel::Audio);
        }
        if secs >= self.ladder.guide {
            target = target.max(ScaffoldingLevel::Guide);
        }

        if target > self.level {
            log::info!("scaffolding on {} rises {:?} -> {:?} at {}s", focus, self.level, target, elapsed);
            self.level = target;
            signals.push(TurnSignal::Escalated { focus: focus.clone(), level: target });
        }
        if hint_now {
            self.hint_given = true;
            signals.push(TurnSignal::HintDue { focus: focus.clone() });
        }
    }
}
