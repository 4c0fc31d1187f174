//! Score bookkeeping for a run.

use serde::{Deserialize, Serialize};

use crate::events::GameEvent;

/// Accumulates score, pickups and death from game events.
///
/// Events carry no culprit; what ended the run is on the sweep result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    score: i64,
    collected: u32,
    dead: bool,
}

impl ScoreTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds events into the totals.
    pub fn apply(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::ScoreChanged { delta } => self.score += i64::from(delta),
                GameEvent::ObjectCollected { .. } => self.collected += 1,
                GameEvent::PlayerDied => self.dead = true,
            }
        }
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    /// Number of collectibles picked up.
    #[must_use]
    pub const fn collected(&self) -> u32 {
        self.collected
    }

    /// Whether a death has been recorded.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Clears everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
