//! # Arena Referee
//!
//! Referee core for team objective matches played in a shared voxel world.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ARENA REFEREE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── ids.rs      - Player, world and team identifiers        │
//! │  ├── vec3.rs     - World positions and block coordinates     │
//! │  ├── rng.rs      - Seeded Xorshift128+ for team balancing    │
//! │  └── hash.rs     - Layout hashing for save skipping          │
//! │                                                              │
//! │  region/         - Spatial model                             │
//! │  ├── shape.rs    - Cuboid and point shapes                   │
//! │  └── registry.rs - Tag-keyed shape parsers                   │
//! │                                                              │
//! │  game/           - Referee logic                             │
//! │  ├── state.rs    - Match state machine                       │
//! │  ├── team.rs     - Rosters, regions, win-conditions          │
//! │  ├── objective.rs- Goal tracking                             │
//! │  ├── events.rs   - Notifications and sinks                   │
//! │  ├── world.rs    - Host-world capabilities                   │
//! │  └── tick.rs     - Observation tick loop                     │
//! │                                                              │
//! │  config/         - Settings and persisted world documents    │
//! │  registry.rs     - Matches by world, player index            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Match state lives in `BTreeMap`s and team balancing draws from a seeded
//! RNG, so replaying the same observations against the same world gives
//! the same notifications in the same order.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod region;
pub mod game;
pub mod config;
pub mod registry;

// Re-export commonly used types
pub use core::ids::{PlayerId, TeamId, WorldId};
pub use core::vec3::{BlockPos, Vec3};
pub use core::rng::DeterministicRng;
pub use region::{Region, RegionFlag, RegionRegistry};
pub use game::state::{Match, RefereeError};
pub use game::status::MatchStatus;
pub use game::tick::{tick, Observation, TickResult};
pub use config::{RefereeConfig, MatchSettings};
pub use registry::RefereeContext;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Observation ticks per second
pub const TICK_RATE: u32 = 20;

/// Default countdown before play (seconds)
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;

/// How far outside its regions a player may stand before counting as out
/// of bounds (blocks)
pub const SNEAK_DISTANCE: f64 = 0.301;

/// World time set when play starts (ticks)
pub const DEFAULT_START_TIME: i64 = 8000;

/// Default win-condition tolerance (blocks)
pub const DEFAULT_INEXACT_RANGE: u32 = 0;

/// Largest accepted win-condition tolerance (blocks)
pub const MAX_INEXACT_RANGE: u32 = 32;
