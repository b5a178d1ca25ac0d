//! Referee Context
//!
//! Owns every live match, keyed by world, plus the index of which world
//! each player is in. Construct one per process and pass it to whatever
//! drives the referee; there is no global.

use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::config::document::{load_match, to_document};
use crate::config::{ConfigError, LoadWarning, MatchStore, RefereeConfig};
use crate::core::hash::{short_hex, LayoutHash};
use crate::core::ids::{PlayerId, TeamId, WorldId};
use crate::core::vec3::Vec3;
use crate::game::events::{NotificationSink, TracingSink};
use crate::game::player::PlayerSession;
use crate::game::state::Match;
use crate::region::RegionRegistry;

/// Matches by world plus the player index.
#[derive(Debug)]
pub struct RefereeContext {
    /// Process-wide settings
    config: RefereeConfig,

    /// Region description parsers
    regions: RegionRegistry,

    /// Live matches
    matches: BTreeMap<WorldId, Match>,

    /// World each known player is in
    player_worlds: BTreeMap<PlayerId, WorldId>,

    /// Layout hash of the last successful save (or load) per world
    saved_hashes: BTreeMap<WorldId, LayoutHash>,
}

impl RefereeContext {
    /// Context with the builtin region shapes.
    pub fn new(config: RefereeConfig) -> Self {
        Self::with_regions(config, RegionRegistry::default())
    }

    /// Context with a custom region registry.
    pub fn with_regions(config: RefereeConfig, regions: RegionRegistry) -> Self {
        Self {
            config,
            regions,
            matches: BTreeMap::new(),
            player_worlds: BTreeMap::new(),
            saved_hashes: BTreeMap::new(),
        }
    }

    /// Process-wide settings.
    pub fn config(&self) -> &RefereeConfig {
        &self.config
    }

    /// Region description parsers.
    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    // =========================================================================
    // Worlds
    // =========================================================================

    /// Create an empty match for a world, or return the existing one.
    pub fn register_world(&mut self, world: WorldId) -> &mut Match {
        let config = &self.config;
        self.matches.entry(world).or_insert_with(|| {
            info!(%world, "Registered world");
            let mut m = Match::new(world, config.match_settings());
            m.set_inexact_range(config.inexact_range);
            m
        })
    }

    /// Load a world's match from the store with tracing notifications.
    /// Returns `None` when the store has no document for it.
    pub fn load_world(
        &mut self,
        world: WorldId,
        store: &dyn MatchStore,
    ) -> Result<Option<Vec<LoadWarning>>, ConfigError> {
        self.load_world_with_sink(world, store, Box::new(TracingSink))
    }

    /// Load a world's match, sending its notifications to `sink`. Any
    /// match already registered for the world is destroyed first, along
    /// with its player index entries.
    pub fn load_world_with_sink(
        &mut self,
        world: WorldId,
        store: &dyn MatchStore,
        sink: Box<dyn NotificationSink>,
    ) -> Result<Option<Vec<LoadWarning>>, ConfigError> {
        if !store.exists(world) {
            debug!(%world, "No referee document; world left unmanaged");
            return Ok(None);
        }

        let doc = store.load(world)?;
        let loaded = load_match(&doc, world, self.config.match_settings(), &self.regions, sink);
        let hash = to_document(&loaded.state).layout_hash();
        info!(
            %world,
            map = loaded.state.map_name(),
            teams = loaded.state.team_count(),
            warnings = loaded.warnings.len(),
            layout = %short_hex(&hash),
            "Loaded world"
        );

        if self.destroy_world(world).is_some() {
            warn!(%world, "Replaced an existing match");
        }
        self.saved_hashes.insert(world, hash);
        self.matches.insert(world, loaded.state);
        Ok(Some(loaded.warnings))
    }

    /// Persist a world's layout. Unchanged layouts are not rewritten.
    /// Failures are logged and reported as `false`.
    pub fn save_world(&mut self, world: WorldId, store: &mut dyn MatchStore) -> bool {
        if !self.config.save_worlds {
            debug!(%world, "World saving disabled");
            return false;
        }
        let Some(m) = self.matches.get(&world) else {
            warn!(%world, "Save requested for unknown world");
            return false;
        };

        let doc = to_document(m);
        let hash = doc.layout_hash();
        if self.saved_hashes.get(&world) == Some(&hash) {
            debug!(%world, layout = %short_hex(&hash), "Layout unchanged; save skipped");
            return true;
        }

        match store.save(world, &doc) {
            Ok(()) => {
                info!(%world, layout = %short_hex(&hash), "Saved world");
                self.saved_hashes.insert(world, hash);
                true
            }
            Err(e) => {
                error!(%world, "Failed to save world: {}", e);
                false
            }
        }
    }

    /// Match for a world.
    pub fn get(&self, world: WorldId) -> Option<&Match> {
        self.matches.get(&world)
    }

    /// Mutable match for a world.
    pub fn get_mut(&mut self, world: WorldId) -> Option<&mut Match> {
        self.matches.get_mut(&world)
    }

    /// Managed worlds, sorted.
    pub fn worlds(&self) -> impl Iterator<Item = WorldId> + '_ {
        self.matches.keys().copied()
    }

    /// Number of managed worlds.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// No worlds managed.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Tear down a world's match and every index entry pointing at it.
    pub fn destroy_world(&mut self, world: WorldId) -> Option<Match> {
        let removed = self.matches.remove(&world)?;
        self.saved_hashes.remove(&world);
        let before = self.player_worlds.len();
        self.player_worlds.retain(|_, w| *w != world);
        info!(%world, released = before - self.player_worlds.len(), "Destroyed world");
        Some(removed)
    }

    /// Drop index entries whose world is gone or whose match no longer
    /// knows the player. Returns how many were removed.
    pub fn sweep_orphans(&mut self) -> usize {
        let matches = &self.matches;
        let before = self.player_worlds.len();
        self.player_worlds
            .retain(|player, world| matches.get(world).is_some_and(|m| m.player(*player).is_some()));
        let swept = before - self.player_worlds.len();
        if swept > 0 {
            warn!(swept, "Swept orphaned player entries");
        }
        swept
    }

    // =========================================================================
    // Players
    // =========================================================================

    /// A player session appeared in a world. Leaving the previous world is
    /// implied. Returns false if the world is not managed.
    pub fn player_entered(&mut self, session: &PlayerSession, world: WorldId, position: Vec3) -> bool {
        if !self.matches.contains_key(&world) {
            return false;
        }

        if let Some(previous) = self.player_worlds.insert(session.id, world) {
            if previous != world {
                if let Some(m) = self.matches.get_mut(&previous) {
                    m.player_disconnected(session.id);
                }
            }
        }

        match self.matches.get_mut(&world) {
            Some(m) => {
                m.player_connected(session, position);
                true
            }
            None => false,
        }
    }

    /// A player session left the server.
    pub fn player_left(&mut self, player: PlayerId) {
        if let Some(world) = self.player_worlds.remove(&player) {
            if let Some(m) = self.matches.get_mut(&world) {
                m.player_disconnected(player);
            }
        }
    }

    /// World a player is in.
    pub fn world_of(&self, player: PlayerId) -> Option<WorldId> {
        self.player_worlds.get(&player).copied()
    }

    /// Match a player is in.
    pub fn match_for_player(&self, player: PlayerId) -> Option<&Match> {
        self.matches.get(&self.world_of(player)?)
    }

    /// Mutable match a player is in.
    pub fn match_for_player_mut(&mut self, player: PlayerId) -> Option<&mut Match> {
        let world = self.world_of(player)?;
        self.matches.get_mut(&world)
    }

    /// World and team a player belongs to.
    pub fn team_for_player(&self, player: PlayerId) -> Option<(WorldId, TeamId)> {
        let m = self.match_for_player(player)?;
        Some((m.world_id(), m.player_team(player)?.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::{MapSection, WorldDocument};
    use crate::config::MemoryStore;
    use crate::game::events::MemorySink;
    use crate::game::state::JoinOptions;
    use crate::game::world::SimulatedWorld;

    fn wid(byte: u8) -> WorldId {
        WorldId::new([byte; 16])
    }

    fn session(byte: u8, name: &str) -> PlayerSession {
        PlayerSession::new(PlayerId::new([byte; 16]), name)
    }

    fn store_with(world: WorldId, text: &str) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert(world, WorldDocument::parse(text).unwrap());
        store
    }

    const DOC: &str = r#"
map:
  name: Duel
match:
  teams:
    - name: Red
      win-condition: ["0,64,0:wool,14"]
    - name: Blue
      win-condition: ["10,64,0:wool,11"]
"#;

    struct BrokenStore;

    impl MatchStore for BrokenStore {
        fn exists(&self, _world: WorldId) -> bool {
            false
        }

        fn load(&self, world: WorldId) -> Result<WorldDocument, ConfigError> {
            Err(ConfigError::NotFound(world.to_string()))
        }

        fn save(&mut self, _world: WorldId, _doc: &WorldDocument) -> Result<(), ConfigError> {
            Err(ConfigError::Io {
                path: "referee.yml".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn test_incompatible_world_is_ignored() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        let loaded = ctx.load_world(wid(1), &MemoryStore::new()).unwrap();
        assert!(loaded.is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_load_world() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        let store = store_with(wid(1), DOC);
        let warnings = ctx
            .load_world_with_sink(wid(1), &store, Box::new(MemorySink::new()))
            .unwrap()
            .unwrap();
        assert!(warnings.is_empty());

        let m = ctx.get(wid(1)).unwrap();
        assert_eq!(m.map_name(), "Duel");
        assert_eq!(m.team_count(), 2);
        assert_eq!(ctx.worlds().collect::<Vec<_>>(), vec![wid(1)]);
    }

    #[test]
    fn test_save_skips_unchanged_layout() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        let mut store = store_with(wid(1), DOC);
        ctx.load_world(wid(1), &store).unwrap();

        assert!(ctx.save_world(wid(1), &mut store));
        assert_eq!(store.save_count(), 0);

        ctx.get_mut(wid(1)).unwrap().set_allow_friendly_fire(true);
        assert!(ctx.save_world(wid(1), &mut store));
        assert!(ctx.save_world(wid(1), &mut store));
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.get(wid(1)).unwrap().game.allow_ff, Some(true));
    }

    #[test]
    fn test_save_failures_are_reported() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        ctx.register_world(wid(2));
        assert!(!ctx.save_world(wid(2), &mut BrokenStore));
        assert!(!ctx.save_world(wid(3), &mut MemoryStore::new()));

        let mut quiet = RefereeContext::new(RefereeConfig { save_worlds: false, ..RefereeConfig::default() });
        quiet.register_world(wid(2));
        let mut store = MemoryStore::new();
        assert!(!quiet.save_world(wid(2), &mut store));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_register_world_applies_config() {
        let mut ctx = RefereeContext::new(RefereeConfig { inexact_range: 2, ..RefereeConfig::default() });
        ctx.register_world(wid(1)).set_map_name("Fresh");
        let m = ctx.register_world(wid(1));
        assert_eq!(m.map_name(), "Fresh");
        assert_eq!(m.inexact_range(), 2);

        let mut store = MemoryStore::new();
        assert!(ctx.save_world(wid(1), &mut store));
        assert_eq!(
            store.get(wid(1)).unwrap().map,
            MapSection { name: Some("Fresh".to_string()) }
        );
    }

    #[test]
    fn test_player_index_follows_worlds() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        ctx.register_world(wid(1));
        ctx.register_world(wid(2));
        let alice = session(1, "alice");

        assert!(!ctx.player_entered(&alice, wid(9), Vec3::ZERO));
        assert!(ctx.player_entered(&alice, wid(1), Vec3::ZERO));
        assert!(ctx.player_entered(&alice, wid(2), Vec3::ZERO));
        assert_eq!(ctx.world_of(alice.id), Some(wid(2)));
        assert!(!ctx.get(wid(1)).unwrap().player(alice.id).unwrap().online);

        ctx.player_left(alice.id);
        assert!(ctx.match_for_player(alice.id).is_none());
        assert!(!ctx.get(wid(2)).unwrap().player(alice.id).unwrap().online);
    }

    #[test]
    fn test_team_lookup() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        let store = store_with(wid(1), DOC);
        ctx.load_world_with_sink(wid(1), &store, Box::new(MemorySink::new())).unwrap();
        let alice = session(1, "alice");
        ctx.player_entered(&alice, wid(1), Vec3::ZERO);
        assert_eq!(ctx.team_for_player(alice.id), None);

        let mut world = SimulatedWorld::new(Vec3::ZERO);
        let m = ctx.match_for_player_mut(alice.id).unwrap();
        let red = m.find_team("red").unwrap();
        m.join(&mut world, alice.id, red, JoinOptions::default()).unwrap();
        assert_eq!(ctx.team_for_player(alice.id), Some((wid(1), red)));
    }

    #[test]
    fn test_destroy_releases_index() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        ctx.register_world(wid(1));
        ctx.register_world(wid(2));
        ctx.player_entered(&session(1, "alice"), wid(1), Vec3::ZERO);
        ctx.player_entered(&session(2, "bob"), wid(1), Vec3::ZERO);
        ctx.player_entered(&session(3, "carol"), wid(2), Vec3::ZERO);

        let removed = ctx.destroy_world(wid(1)).unwrap();
        assert_eq!(removed.players().len(), 2);
        assert!(ctx.get(wid(1)).is_none());
        assert_eq!(ctx.world_of(PlayerId::new([1; 16])), None);
        assert_eq!(ctx.world_of(PlayerId::new([3; 16])), Some(wid(2)));
        assert!(ctx.destroy_world(wid(1)).is_none());
    }

    #[test]
    fn test_reload_releases_player_index() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        let store = store_with(wid(1), DOC);
        ctx.load_world_with_sink(wid(1), &store, Box::new(MemorySink::new())).unwrap();
        let alice = session(1, "alice");
        ctx.player_entered(&alice, wid(1), Vec3::ZERO);
        assert_eq!(ctx.world_of(alice.id), Some(wid(1)));

        ctx.load_world_with_sink(wid(1), &store, Box::new(MemorySink::new())).unwrap();
        assert_eq!(ctx.world_of(alice.id), None);
        assert!(ctx.match_for_player(alice.id).is_none());
        assert!(ctx.get(wid(1)).unwrap().player(alice.id).is_none());
        assert_eq!(ctx.sweep_orphans(), 0);

        assert!(ctx.player_entered(&alice, wid(1), Vec3::ZERO));
        assert_eq!(ctx.match_for_player(alice.id).map(Match::world_id), Some(wid(1)));
    }

    #[test]
    fn test_sweep_orphans() {
        let mut ctx = RefereeContext::new(RefereeConfig::default());
        ctx.register_world(wid(1));
        ctx.player_entered(&session(1, "alice"), wid(1), Vec3::ZERO);
        // Stale entries: a vanished world, and a player the match never saw
        ctx.player_worlds.insert(PlayerId::new([2; 16]), wid(7));
        ctx.player_worlds.insert(PlayerId::new([3; 16]), wid(1));

        assert_eq!(ctx.sweep_orphans(), 2);
        assert_eq!(ctx.world_of(PlayerId::new([1; 16])), Some(wid(1)));
        assert_eq!(ctx.sweep_orphans(), 0);
    }
}
