//! Player Records
//!
//! Session facts reported by the host plus the referee's per-player view.
//! Team membership is owned by `Team`; `PlayerRecord::team` is a
//! back-reference kept in step by `Match`.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::ids::{PlayerId, TeamId};
use crate::core::vec3::Vec3;
use crate::game::objective::BlockSignature;

/// Full health in half-hearts.
pub const MAX_HEALTH: u32 = 20;

/// Player game mode, as requested from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Normal play
    Survival,
    /// No block interaction
    Adventure,
    /// Unlimited building
    Creative,
    /// Invisible observer
    Spectator,
}

/// Facts the host reports when a player session appears.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    /// Stable player identity
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Session uses a disallowed client modification
    pub instrumented_client: bool,
}

impl PlayerSession {
    /// Create a session with a plain client.
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            instrumented_client: false,
        }
    }
}

/// Referee's view of one player in a match world.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Stable player identity
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Session uses a disallowed client modification
    pub instrumented_client: bool,

    /// Present in the world right now
    pub online: bool,

    /// Team back-reference
    pub team: Option<TeamId>,

    /// Last accepted position
    pub position: Vec3,

    /// Health in half-hearts
    pub health: u32,

    /// Armor points
    pub armor: u32,

    /// Objective signatures currently held
    pub carrying: BTreeSet<BlockSignature>,
}

impl PlayerRecord {
    /// Create an online record from a session.
    pub fn new(session: &PlayerSession, position: Vec3) -> Self {
        Self {
            id: session.id,
            name: session.name.clone(),
            instrumented_client: session.instrumented_client,
            online: true,
            team: None,
            position,
            health: MAX_HEALTH,
            armor: 0,
            carrying: BTreeSet::new(),
        }
    }

    /// Is this record carrying a matching item?
    pub fn carries(&self, signature: &BlockSignature) -> bool {
        self.carrying.iter().any(|held| signature.matches(held))
    }

    /// Replace the carried set. Returns (gained, lost).
    pub fn set_carrying(
        &mut self,
        carrying: BTreeSet<BlockSignature>,
    ) -> (Vec<BlockSignature>, Vec<BlockSignature>) {
        let gained = carrying.difference(&self.carrying).cloned().collect();
        let lost = self.carrying.difference(&carrying).cloned().collect();
        self.carrying = carrying;
        (gained, lost)
    }
}

/// Rank a name against a search needle (lower is better).
///
/// Exact case-insensitive matches score 0; substring matches score the
/// number of unmatched characters; anything else is no match.
pub fn name_search(name: &str, needle: &str) -> Option<usize> {
    let name = name.to_lowercase();
    let needle = needle.to_lowercase();
    if needle.is_empty() || !name.contains(&needle) {
        return None;
    }
    Some(name.len() - needle.len())
}
