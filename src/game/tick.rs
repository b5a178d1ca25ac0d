//! Observation Tick
//!
//! The single mutation path for world events. Each tick applies the
//! observations reported since the last one, advances the countdown and
//! re-evaluates objectives when something relevant changed or the periodic
//! interval elapsed.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::ids::PlayerId;
use crate::core::vec3::{BlockPos, Vec3};
use crate::game::objective::BlockSignature;
use crate::game::player::PlayerSession;
use crate::game::state::Match;
use crate::game::world::WorldHost;

/// A discrete fact reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    /// Player session appeared in the world
    PlayerJoinedWorld {
        /// Who appeared
        session: PlayerSession,
        /// Where they appeared
        position: Vec3,
    },

    /// Player session left the world
    PlayerLeftWorld {
        /// Who left
        player: PlayerId,
    },

    /// Player position changed
    PlayerMoved {
        /// Who moved
        player: PlayerId,
        /// New position
        to: Vec3,
    },

    /// A block was placed or broken; the host holds the new state
    BlockChanged {
        /// Changed block
        pos: BlockPos,
    },

    /// Health or armor changed
    HealthChanged {
        /// Whose health changed
        player: PlayerId,
        /// Health points
        health: u32,
        /// Armor points
        armor: u32,
    },

    /// Held items changed
    InventoryChanged {
        /// Whose items changed
        player: PlayerId,
        /// Item signatures now held
        carrying: BTreeSet<BlockSignature>,
    },

    /// Player looked at or touched an objective
    ObjectiveSighted {
        /// Who saw it
        player: PlayerId,
        /// Objective signature
        signature: BlockSignature,
        /// Where it was seen
        at: Vec3,
    },

    /// Start mechanism changed state
    TriggerActuated {
        /// Trigger block
        location: BlockPos,
        /// New powered state
        powered: bool,
    },
}

/// Result of a tick.
#[derive(Debug, Default, PartialEq)]
pub struct TickResult {
    /// Tick number just processed
    pub tick: u64,
    /// Match entered PLAYING this tick
    pub started: bool,
    /// Objectives were re-evaluated this tick
    pub evaluated: bool,
    /// Players sent back out of forbidden zones
    pub zone_violations: Vec<PlayerId>,
}

/// Run one observation tick.
pub fn tick(m: &mut Match, host: &mut dyn WorldHost, observations: &[Observation]) -> TickResult {
    let mut result = TickResult {
        tick: m.advance_tick(),
        ..TickResult::default()
    };
    let mut dirty = false;

    for observation in observations {
        match observation {
            Observation::PlayerJoinedWorld { session, position } => {
                m.player_connected(session, *position);
            }
            Observation::PlayerLeftWorld { player } => {
                m.player_disconnected(*player);
                dirty = true;
            }
            Observation::PlayerMoved { player, to } => {
                if !m.observe_move(host, *player, *to) {
                    result.zone_violations.push(*player);
                }
            }
            Observation::BlockChanged { pos } => {
                debug!(%pos, "Block changed");
                dirty = true;
            }
            Observation::HealthChanged { player, health, armor } => {
                m.observe_health(*player, *health, *armor);
            }
            Observation::InventoryChanged { player, carrying } => {
                dirty |= m.observe_carrying(*player, carrying.clone());
            }
            Observation::ObjectiveSighted { player, signature, at } => {
                m.observe_sighting(*player, signature, *at);
            }
            Observation::TriggerActuated { location, powered } => {
                match m.actuate_trigger(host, *location, *powered) {
                    Ok(moved) => result.started |= moved && m.status().in_progress(),
                    Err(e) => warn!(%location, "Ignored trigger: {}", e),
                }
            }
        }
    }

    result.started |= m.advance_countdown(host);

    let periodic = result.tick % m.settings().objective_interval == 0;
    if m.status().in_progress() && (dirty || periodic) {
        m.update_objectives(&*host);
        result.evaluated = true;
    }

    result
}
