//! Game rules: hints, target drawing, and the single-player round.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::Rng;

use crate::GameConfig;

// ---------------------------------------------------------------------------
// Hint
// ---------------------------------------------------------------------------

/// The answer to one in-range guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    TooSmall,
    TooHigh,
    Correct,
}

impl Hint {
    /// Compares a guess with the target. Equality is the only win.
    pub fn judge(guess: i64, target: i64) -> Self {
        match guess.cmp(&target) {
            Ordering::Less => Self::TooSmall,
            Ordering::Greater => Self::TooHigh,
            Ordering::Equal => Self::Correct,
        }
    }

    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

// ---------------------------------------------------------------------------
// TargetSource
// ---------------------------------------------------------------------------

/// Where hidden numbers come from.
///
/// The server uses [`RandomTargets`]; tests and demos inject
/// [`ScriptedTargets`] to make rounds reproducible.
pub trait TargetSource: Send + Sync + 'static {
    /// Draws a number within `config.low..=config.high`.
    fn draw(&self, config: &GameConfig) -> i64;
}

/// Uniformly random targets from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTargets;

impl TargetSource for RandomTargets {
    fn draw(&self, config: &GameConfig) -> i64 {
        rand::rng().random_range(config.low..=config.high)
    }
}

/// Targets taken from a fixed script.
///
/// Values are handed out in order; once the script runs dry the last value
/// repeats. An empty script always yields `config.low`.
#[derive(Debug)]
pub struct ScriptedTargets {
    script: Mutex<VecDeque<i64>>,
    last: Mutex<Option<i64>>,
}

impl ScriptedTargets {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            script: Mutex::new(values.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

impl TargetSource for ScriptedTargets {
    fn draw(&self, config: &GameConfig) -> i64 {
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = next {
            *last = Some(value);
        }
        last.unwrap_or(config.low)
    }
}

// ---------------------------------------------------------------------------
// SinglePlayerGame
// ---------------------------------------------------------------------------

/// What a single-player guess led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleOutcome {
    /// Outside the allowed range; no attempt used.
    OutOfRange,
    /// Wrong, attempts remain.
    Hint(Hint),
    /// Correct; the round is over.
    Won,
    /// Wrong and that was the last attempt; the round is over.
    Exhausted,
}

impl SingleOutcome {
    pub fn ends_round(self) -> bool {
        matches!(self, Self::Won | Self::Exhausted)
    }
}

/// One private round. Owned by exactly one session and dropped when the
/// round ends.
#[derive(Debug, Clone)]
pub struct SinglePlayerGame {
    config: GameConfig,
    target: i64,
    attempts: u32,
    finished: bool,
}

impl SinglePlayerGame {
    pub fn new(config: GameConfig, target: i64) -> Self {
        Self {
            config,
            target,
            attempts: 0,
            finished: false,
        }
    }

    /// Draws a fresh target from `targets`.
    pub fn start(config: GameConfig, targets: &dyn TargetSource) -> Self {
        Self::new(config, targets.draw(&config))
    }

    /// Plays one guess.
    ///
    /// Once the round has ended every further call reports `Exhausted`
    /// and changes nothing.
    pub fn guess(&mut self, value: i64) -> SingleOutcome {
        if self.finished {
            return SingleOutcome::Exhausted;
        }
        if !self.config.contains(value) {
            return SingleOutcome::OutOfRange;
        }

        self.attempts += 1;
        let hint = Hint::judge(value, self.target);
        let outcome = if hint.is_correct() {
            SingleOutcome::Won
        } else if self.attempts >= self.config.max_attempts {
            SingleOutcome::Exhausted
        } else {
            SingleOutcome::Hint(hint)
        };
        self.finished = outcome.ends_round();
        outcome
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
