//! Referee Configuration
//!
//! Process-wide settings with environment overrides, plus the per-world
//! match document and the stores that persist it.
//!
//! ## Module Structure
//!
//! - `document`: persisted world document and its Match conversion
//! - `store`: persistence collaborators (YAML files, in-memory)

pub mod document;
pub mod store;

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::{DEFAULT_COUNTDOWN_SECONDS, MAX_INEXACT_RANGE, TICK_RATE};

pub use document::{LoadWarning, LoadResult, WorldDocument};
pub use store::{MatchStore, MemoryStore, YamlFileStore};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No document stored for the world.
    #[error("No referee document for world {0}")]
    NotFound(String),
}

/// Process-wide referee settings.
#[derive(Debug, Clone)]
pub struct RefereeConfig {
    /// Countdown before play starts (seconds).
    pub countdown_seconds: u32,
    /// Ticks between periodic objective evaluations.
    pub objective_interval: u64,
    /// Default win-condition tolerance for new worlds.
    pub inexact_range: u32,
    /// Team sizes are capped and players are placed by referees.
    pub manual_roster: bool,
    /// Persist world documents on save requests.
    pub save_worlds: bool,
    /// Fixed seed for team balancing. `None` derives one per world.
    pub rng_seed: Option<u64>,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            objective_interval: TICK_RATE as u64,
            inexact_range: 0,
            manual_roster: false,
            save_worlds: true,
            rng_seed: None,
        }
    }
}

impl RefereeConfig {
    /// Defaults overridden by `REFEREE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            countdown_seconds: env_or("REFEREE_COUNTDOWN_SECONDS", defaults.countdown_seconds),
            objective_interval: env_or("REFEREE_OBJECTIVE_INTERVAL", defaults.objective_interval).max(1),
            inexact_range: env_or("REFEREE_INEXACT_RANGE", defaults.inexact_range).min(MAX_INEXACT_RANGE),
            manual_roster: env_or("REFEREE_MANUAL_ROSTER", defaults.manual_roster),
            save_worlds: env_or("REFEREE_SAVE_WORLDS", defaults.save_worlds),
            rng_seed: std::env::var("REFEREE_RNG_SEED").ok().and_then(|v| parse_or_warn("REFEREE_RNG_SEED", &v)),
        }
    }

    /// Per-match projection.
    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            countdown_seconds: self.countdown_seconds,
            objective_interval: self.objective_interval.max(1),
            manual_roster: self.manual_roster,
            rng_seed: self.rng_seed,
        }
    }
}

/// Settings a single match runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
    /// Countdown before play starts (seconds).
    pub countdown_seconds: u32,
    /// Ticks between periodic objective evaluations.
    pub objective_interval: u64,
    /// Team sizes are capped.
    pub manual_roster: bool,
    /// Fixed balancing seed.
    pub rng_seed: Option<u64>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        RefereeConfig::default().match_settings()
    }
}

impl MatchSettings {
    /// Countdown length in ticks.
    pub fn countdown_ticks(&self) -> u32 {
        self.countdown_seconds * TICK_RATE
    }
}

/// Parse an environment variable, keeping the default when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => parse_or_warn(name, &v).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_or_warn<T: FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!("Ignoring invalid {}={:?}", name, value);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RefereeConfig::default();
        assert_eq!(config.countdown_seconds, 3);
        assert_eq!(config.objective_interval, 20);
        assert!(config.save_worlds);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_match_settings_projection() {
        let config = RefereeConfig {
            countdown_seconds: 5,
            objective_interval: 0,
            manual_roster: true,
            rng_seed: Some(9),
            ..RefereeConfig::default()
        };
        let settings = config.match_settings();
        assert_eq!(settings.countdown_ticks(), 100);
        assert_eq!(settings.objective_interval, 1);
        assert!(settings.manual_roster);
        assert_eq!(settings.rng_seed, Some(9));
    }

    #[test]
    fn test_env_or_falls_back() {
        std::env::set_var("REFEREE_TEST_ENV_OR_BAD", "many");
        std::env::set_var("REFEREE_TEST_ENV_OR_GOOD", " 12 ");
        assert_eq!(env_or("REFEREE_TEST_ENV_OR_BAD", 7u32), 7);
        assert_eq!(env_or("REFEREE_TEST_ENV_OR_GOOD", 7u32), 12);
        assert!(env_or("REFEREE_TEST_ENV_OR_UNSET", true));
    }
}
