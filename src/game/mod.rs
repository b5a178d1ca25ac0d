//! Referee Core
//!
//! Match lifecycle, teams and objective tracking. Everything here is driven
//! by explicit calls and observation ticks; the host world is reached only
//! through the `WorldHost` trait.
//!
//! ## Module Structure
//!
//! - `status`: match lifecycle states
//! - `player`: player sessions and per-match records
//! - `objective`: block signatures, win-conditions, goal tracking
//! - `team`: team roster, regions and objectives
//! - `state`: the match state machine
//! - `events`: notifications and their sinks
//! - `world`: host-world capabilities and an in-memory world
//! - `tick`: the observation tick loop

pub mod status;
pub mod player;
pub mod objective;
pub mod team;
pub mod state;
pub mod events;
pub mod world;
pub mod tick;

// Re-export key types
pub use status::MatchStatus;
pub use player::{GameMode, PlayerRecord, PlayerSession};
pub use objective::{BlockSignature, GoalStatus, ObjectiveTracker, WinCondition};
pub use team::{Team, TeamColor};
pub use state::{JoinOptions, Match, RefereeError, RefereeResult};
pub use events::{Notification, NotificationData, NotificationSink};
pub use world::{SimulatedWorld, WorldHost};
pub use tick::{Observation, TickResult};
