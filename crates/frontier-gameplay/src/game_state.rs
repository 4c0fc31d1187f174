//! Run lifecycle.
//!
//! A run goes `Ready → Playing ⇄ Paused → GameOver`, and `reset` returns to
//! `Ready` from anywhere. Only `Playing` advances the world.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Waiting to start.
    #[default]
    Ready,
    /// Running; the sweep is active.
    Playing,
    /// Frozen mid-run.
    Paused,
    /// The player died.
    GameOver,
}

/// A transition that the current phase does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while {from:?}")]
pub struct PhaseError {
    /// Phase the transition was attempted from
    pub from: GamePhase,
    /// Attempted transition
    pub action: &'static str,
}

impl GamePhase {
    /// Whether the world should advance.
    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether the run has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver)
    }

    /// `Ready → Playing`.
    pub fn start(&mut self) -> Result<(), PhaseError> {
        self.transition("start", Self::Ready, Self::Playing)
    }

    /// `Playing → Paused`.
    pub fn pause(&mut self) -> Result<(), PhaseError> {
        self.transition("pause", Self::Playing, Self::Paused)
    }

    /// `Paused → Playing`.
    pub fn resume(&mut self) -> Result<(), PhaseError> {
        self.transition("resume", Self::Paused, Self::Playing)
    }

    /// `Playing | Paused → GameOver`.
    pub fn end(&mut self) -> Result<(), PhaseError> {
        match self {
            Self::Playing | Self::Paused => {
                *self = Self::GameOver;
                Ok(())
            },
            _ => Err(PhaseError {
                from: *self,
                action: "end",
            }),
        }
    }

    /// Back to `Ready` from any phase.
    pub fn reset(&mut self) {
        *self = Self::Ready;
    }

    fn transition(&mut self, action: &'static str, from: Self, to: Self) -> Result<(), PhaseError> {
        if *self != from {
            return Err(PhaseError { from: *self, action });
        }
        *self = to;
        Ok(())
    }
}
