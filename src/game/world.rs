//! Host World
//!
//! Capabilities the referee needs from the game host: block lookups,
//! player inventories and a handful of side effects. `SimulatedWorld` is an
//! in-memory host that records every side effect it is asked to perform.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::ids::PlayerId;
use crate::core::vec3::{BlockPos, Vec3};
use crate::game::objective::BlockSignature;
use crate::game::player::GameMode;

/// Host capabilities consumed by a match.
pub trait WorldHost {
    /// Default spawn of the world.
    fn world_spawn(&self) -> Vec3;

    /// Block at a position. `None` for unloaded or empty.
    fn block_at(&self, pos: BlockPos) -> Option<BlockSignature>;

    /// Item signatures a player currently holds.
    fn carried_items(&self, player: PlayerId) -> BTreeSet<BlockSignature>;

    /// Move a player.
    fn teleport(&mut self, player: PlayerId, to: Vec3);

    /// Change a player's game mode.
    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode);

    /// Restore health, hunger and remove effects.
    fn heal(&mut self, player: PlayerId);

    /// Drive a start mechanism (lever, button) to a state.
    fn set_mechanism(&mut self, pos: BlockPos, powered: bool);

    /// Set the world time of day in ticks.
    fn set_time(&mut self, ticks: i64);
}

/// A side effect requested from `SimulatedWorld`.
#[derive(Clone, Debug, PartialEq)]
pub enum HostAction {
    /// Player moved by the referee
    Teleport(PlayerId, Vec3),
    /// Game mode change
    GameMode(PlayerId, GameMode),
    /// Player healed
    Heal(PlayerId),
    /// Mechanism driven
    Mechanism(BlockPos, bool),
    /// World time set
    Time(i64),
}

/// In-memory host.
#[derive(Clone, Debug, Default)]
pub struct SimulatedWorld {
    /// World spawn point
    pub spawn: Vec3,
    /// Non-empty blocks
    pub blocks: BTreeMap<BlockPos, BlockSignature>,
    /// Player inventories
    pub inventories: BTreeMap<PlayerId, BTreeSet<BlockSignature>>,
    /// Side effects, oldest first
    pub actions: Vec<HostAction>,
}

impl SimulatedWorld {
    /// Create an empty world with the given spawn.
    pub fn new(spawn: Vec3) -> Self {
        Self {
            spawn,
            ..Self::default()
        }
    }

    /// Place (or with `None`, clear) a block.
    pub fn set_block(&mut self, pos: BlockPos, block: Option<BlockSignature>) {
        match block {
            Some(b) if !b.is_air() => {
                self.blocks.insert(pos, b);
            }
            _ => {
                self.blocks.remove(&pos);
            }
        }
    }

    /// Replace a player's inventory.
    pub fn set_inventory(&mut self, player: PlayerId, items: BTreeSet<BlockSignature>) {
        self.inventories.insert(player, items);
    }

    /// Most recent teleport target for a player.
    pub fn last_teleport(&self, player: PlayerId) -> Option<Vec3> {
        self.actions.iter().rev().find_map(|a| match a {
            HostAction::Teleport(p, to) if *p == player => Some(*to),
            _ => None,
        })
    }
}

impl WorldHost for SimulatedWorld {
    fn world_spawn(&self) -> Vec3 {
        self.spawn
    }

    fn block_at(&self, pos: BlockPos) -> Option<BlockSignature> {
        self.blocks.get(&pos).cloned()
    }

    fn carried_items(&self, player: PlayerId) -> BTreeSet<BlockSignature> {
        self.inventories.get(&player).cloned().unwrap_or_default()
    }

    fn teleport(&mut self, player: PlayerId, to: Vec3) {
        self.actions.push(HostAction::Teleport(player, to));
    }

    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode) {
        self.actions.push(HostAction::GameMode(player, mode));
    }

    fn heal(&mut self, player: PlayerId) {
        self.actions.push(HostAction::Heal(player));
    }

    fn set_mechanism(&mut self, pos: BlockPos, powered: bool) {
        self.actions.push(HostAction::Mechanism(pos, powered));
    }

    fn set_time(&mut self, ticks: i64) {
        self.actions.push(HostAction::Time(ticks));
    }
}
