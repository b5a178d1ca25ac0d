//! Core primitives.
//!
//! World positions, the seeded RNG used for team balancing, and layout
//! hashing. Nothing here knows about teams or matches.

pub mod ids;
pub mod vec3;
pub mod rng;
pub mod hash;

// Re-export core types
pub use ids::{PlayerId, TeamId, WorldId};
pub use vec3::{Vec3, BlockPos};
pub use rng::DeterministicRng;
pub use hash::{LayoutHash, LayoutHasher};
