//! Match Status
//!
//! Lifecycle states and the "before match" gating predicate shared by
//! roster and configuration operations.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Current lifecycle state of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// World registered, not configured
    #[default]
    Idle,
    /// Configured, waiting for teams to ready up
    Setup,
    /// Every team ready
    Ready,
    /// Start armed, counting down
    Countdown,
    /// Active gameplay
    Playing,
    /// Result recorded
    Finished,
}

impl MatchStatus {
    /// Roster and configuration edits are allowed without override.
    #[inline]
    pub fn is_before_match(self) -> bool {
        self < MatchStatus::Playing
    }

    /// Match has started and not yet finished.
    #[inline]
    pub fn in_progress(self) -> bool {
        self == MatchStatus::Playing
    }

    /// Lowercase name used in notifications.
    pub fn name(self) -> &'static str {
        match self {
            MatchStatus::Idle => "idle",
            MatchStatus::Setup => "setup",
            MatchStatus::Ready => "ready",
            MatchStatus::Countdown => "countdown",
            MatchStatus::Playing => "playing",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
