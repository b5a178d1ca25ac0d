//! Team
//!
//! Roster, identity, owned regions, win-conditions and the objective
//! tracker for one team. Collections are exposed read-only; every mutation
//! goes through a `pub(crate)` method called by `Match`, which keeps player
//! back-references in step.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::ids::{PlayerId, TeamId};
use crate::core::vec3::Vec3;
use crate::game::events::{NotificationData, Notifier};
use crate::game::objective::{find_placed, BlockSignature, GoalStatus, ObjectiveChange, ObjectiveTracker, WinCondition};
use crate::game::player::{name_search, PlayerRecord};
use crate::game::world::WorldHost;
use crate::region::{self, Cuboid, Region};
use crate::SNEAK_DISTANCE;

// =============================================================================
// TEAM COLOR
// =============================================================================

/// Chat color tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamColor {
    /// Black
    Black,
    /// Dark blue
    DarkBlue,
    /// Dark green
    DarkGreen,
    /// Dark aqua
    DarkAqua,
    /// Dark red
    DarkRed,
    /// Dark purple
    DarkPurple,
    /// Gold
    Gold,
    /// Gray
    Gray,
    /// Dark gray
    DarkGray,
    /// Blue
    Blue,
    /// Green
    Green,
    /// Aqua
    Aqua,
    /// Red
    Red,
    /// Light purple
    LightPurple,
    /// Yellow
    Yellow,
    /// White
    White,
    /// No color
    #[default]
    Reset,
}

impl TeamColor {
    /// All colors including `Reset`.
    pub const ALL: [TeamColor; 17] = [
        TeamColor::Black, TeamColor::DarkBlue, TeamColor::DarkGreen, TeamColor::DarkAqua,
        TeamColor::DarkRed, TeamColor::DarkPurple, TeamColor::Gold, TeamColor::Gray,
        TeamColor::DarkGray, TeamColor::Blue, TeamColor::Green, TeamColor::Aqua,
        TeamColor::Red, TeamColor::LightPurple, TeamColor::Yellow, TeamColor::White,
        TeamColor::Reset,
    ];

    /// Config name, e.g. `DARK_BLUE`.
    pub fn name(self) -> &'static str {
        match self {
            TeamColor::Black => "BLACK",
            TeamColor::DarkBlue => "DARK_BLUE",
            TeamColor::DarkGreen => "DARK_GREEN",
            TeamColor::DarkAqua => "DARK_AQUA",
            TeamColor::DarkRed => "DARK_RED",
            TeamColor::DarkPurple => "DARK_PURPLE",
            TeamColor::Gold => "GOLD",
            TeamColor::Gray => "GRAY",
            TeamColor::DarkGray => "DARK_GRAY",
            TeamColor::Blue => "BLUE",
            TeamColor::Green => "GREEN",
            TeamColor::Aqua => "AQUA",
            TeamColor::Red => "RED",
            TeamColor::LightPurple => "LIGHT_PURPLE",
            TeamColor::Yellow => "YELLOW",
            TeamColor::White => "WHITE",
            TeamColor::Reset => "RESET",
        }
    }

    /// Parse a config name. Unknown names give `Reset`.
    pub fn parse(s: &str) -> Self {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .unwrap_or(TeamColor::Reset)
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TEAM
// =============================================================================

/// One team in a match.
#[derive(Clone, Debug)]
pub struct Team {
    /// Match-local identity
    id: TeamId,

    /// Internal name from the world document
    name: String,

    /// Display override
    custom_name: Option<String>,

    /// Chat color
    color: TeamColor,

    /// Cap in manual-roster mode (0 = unlimited)
    max_size: u32,

    /// Explicitly marked ready
    ready: bool,

    /// Confirmed members
    members: BTreeSet<PlayerId>,

    /// Names of players expected to join
    expected: BTreeSet<String>,

    /// Owned regions
    regions: Vec<Region>,

    /// Custom spawn
    spawn: Option<Vec3>,

    /// Delivery targets
    win_conditions: Vec<WinCondition>,

    /// Goal state per objective
    tracker: ObjectiveTracker,

    /// Where this team's objective state last changed
    last_objective_location: Option<Vec3>,
}

impl Team {
    /// Create an empty team.
    pub fn new(id: TeamId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            custom_name: None,
            color: TeamColor::Reset,
            max_size: 0,
            ready: false,
            members: BTreeSet::new(),
            expected: BTreeSet::new(),
            regions: Vec::new(),
            spawn: None,
            win_conditions: Vec::new(),
            tracker: ObjectiveTracker::new(),
            last_objective_location: None,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Match-local identity.
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// Internal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display override, if set.
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Custom name if set, else the internal name.
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// Display name lowercased with non-alphanumerics removed.
    pub fn tag(&self) -> String {
        self.display_name()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Case-insensitive substring search over custom and internal names.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.custom_name.as_ref().is_some_and(|c| c.to_lowercase().contains(&needle))
    }

    /// Chat color.
    pub fn color(&self) -> TeamColor {
        self.color
    }

    /// Cap in manual-roster mode (0 = unlimited).
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    // =========================================================================
    // Roster
    // =========================================================================

    /// Explicitly marked ready.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Has members and is marked ready.
    pub fn can_start(&self) -> bool {
        self.ready && !self.members.is_empty()
    }

    /// Confirmed members.
    pub fn members(&self) -> &BTreeSet<PlayerId> {
        &self.members
    }

    /// Number of confirmed members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Is this player a confirmed member?
    pub fn has_member(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    /// Names of players expected to join.
    pub fn expected_players(&self) -> &BTreeSet<String> {
        &self.expected
    }

    /// Neither members nor expected players.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.expected.is_empty()
    }

    /// Would one more member exceed the manual-roster cap?
    pub fn is_full(&self) -> bool {
        self.max_size > 0 && self.members.len() >= self.max_size as usize
    }

    /// Best member match for a name search.
    pub fn find_member(&self, players: &BTreeMap<PlayerId, PlayerRecord>, needle: &str) -> Option<PlayerId> {
        self.members
            .iter()
            .filter_map(|id| players.get(id))
            .filter_map(|p| name_search(&p.name, needle).map(|score| (score, p.id)))
            .min_by_key(|(score, _)| *score)
            .map(|(_, id)| id)
    }

    // =========================================================================
    // Spatial
    // =========================================================================

    /// Owned regions.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Custom spawn, if set.
    pub fn spawn(&self) -> Option<Vec3> {
        self.spawn
    }

    /// Custom spawn, falling back to the world spawn.
    pub fn spawn_location(&self, world_spawn: Vec3) -> Vec3 {
        self.spawn.unwrap_or(world_spawn)
    }

    /// Distance to the closest of the start region and owned regions.
    pub fn distance_to_closest_region(&self, start: Option<&Region>, p: Vec3) -> f64 {
        region::distance_to_closest(start, &self.regions, p)
    }

    /// May a member be at this point?
    pub fn can_enter(&self, start: Option<&Region>, p: Vec3, tolerance: f64) -> bool {
        region::can_enter(start, &self.regions, p, tolerance)
    }

    /// May a member build at this point?
    pub fn can_build(&self, start: Option<&Region>, p: Vec3) -> bool {
        region::can_build(start, &self.regions, p)
    }

    /// Is the point within sneaking distance of the team's space?
    pub fn check_position(&self, start: Option<&Region>, p: Vec3) -> bool {
        self.distance_to_closest_region(start, p) < SNEAK_DISTANCE
    }

    // =========================================================================
    // Objectives
    // =========================================================================

    /// Win-conditions, in insertion order.
    pub fn win_conditions(&self) -> &[WinCondition] {
        &self.win_conditions
    }

    /// Distinct objective signatures, excluding the no-op signature.
    pub fn objectives(&self) -> BTreeSet<BlockSignature> {
        self.win_conditions
            .iter()
            .map(|wc| wc.signature.clone())
            .filter(|sig| !sig.is_air())
            .collect()
    }

    /// Objective tracker.
    pub fn tracker(&self) -> &ObjectiveTracker {
        &self.tracker
    }

    /// Goal status of one objective.
    pub fn objective_status(&self, signature: &BlockSignature) -> GoalStatus {
        self.tracker.status(signature)
    }

    /// Where this team's objective state last changed.
    pub fn last_objective_location(&self) -> Option<Vec3> {
        self.last_objective_location
    }

    /// Midpoint of the box around every win-condition block center.
    pub fn victory_monument_location(&self) -> Option<Vec3> {
        self.win_conditions
            .iter()
            .map(|wc| {
                let c = wc.location.center();
                Cuboid::new(c, c)
            })
            .reduce(Cuboid::combine)
            .map(|b| b.center())
    }

    // =========================================================================
    // Mutation (through Match)
    // =========================================================================

    pub(crate) fn set_custom_name(&mut self, name: Option<&str>, notifier: &mut Notifier) {
        self.custom_name = name.map(str::to_string);
        notifier.emit(NotificationData::TeamRenamed {
            team: self.name.clone(),
            name: self.display_name().to_string(),
        });
    }

    pub(crate) fn set_color(&mut self, color: TeamColor, notifier: &mut Notifier) {
        self.color = color;
        notifier.emit(NotificationData::TeamColor {
            team: self.display_name().to_string(),
            color: color.name().to_string(),
        });
    }

    pub(crate) fn set_max_size(&mut self, max_size: u32) {
        self.max_size = max_size;
    }

    pub(crate) fn set_spawn(&mut self, spawn: Option<Vec3>) {
        self.spawn = spawn;
    }

    /// Returns whether the flag changed.
    pub(crate) fn set_ready(&mut self, ready: bool, notifier: &mut Notifier) -> bool {
        if self.ready == ready {
            return false;
        }
        self.ready = ready;
        notifier.emit(NotificationData::TeamReady {
            team: self.display_name().to_string(),
            ready,
        });
        true
    }

    pub(crate) fn add_member(&mut self, player: &PlayerRecord, notifier: &mut Notifier) -> bool {
        if !self.members.insert(player.id) {
            return false;
        }
        self.expected.remove(&player.name.to_lowercase());
        self.set_ready(false, notifier);
        notifier.emit(NotificationData::TeamRoster {
            team: self.display_name().to_string(),
            player: player.name.clone(),
            joined: true,
        });
        true
    }

    pub(crate) fn remove_member(&mut self, player: &PlayerRecord, notifier: &mut Notifier) -> bool {
        if !self.members.remove(&player.id) {
            return false;
        }
        self.set_ready(false, notifier);
        notifier.emit(NotificationData::TeamRoster {
            team: self.display_name().to_string(),
            player: player.name.clone(),
            joined: false,
        });
        true
    }

    pub(crate) fn add_expected(&mut self, name: &str) -> bool {
        self.expected.insert(name.to_lowercase())
    }

    /// Exchange rosters and display overrides with another team.
    pub(crate) fn swap_roster(&mut self, other: &mut Team) {
        std::mem::swap(&mut self.members, &mut other.members);
        std::mem::swap(&mut self.expected, &mut other.expected);
        std::mem::swap(&mut self.custom_name, &mut other.custom_name);
    }

    pub(crate) fn add_region(&mut self, mut region: Region) {
        region.add_owner(self.id);
        self.regions.push(region);
    }

    /// Add a win-condition. Returns false for duplicates.
    ///
    /// A signature introduced while playing is tracked at NONE immediately.
    pub(crate) fn add_win_condition(&mut self, wc: WinCondition, playing: bool, notifier: &mut Notifier) -> bool {
        if self.win_conditions.contains(&wc) {
            return false;
        }

        let new_objective = !wc.signature.is_air()
            && !self.win_conditions.iter().any(|w| w.signature == wc.signature);
        let signature = wc.signature.clone();
        self.win_conditions.push(wc);

        if new_objective {
            notifier.emit(NotificationData::ObjectiveAdded {
                team: self.display_name().to_string(),
                signature: signature.to_string(),
            });
            if playing {
                self.tracker.track(signature);
            }
        }
        true
    }

    /// Reset the tracker to the current objective set, all at NONE.
    pub(crate) fn reset_objectives(&mut self) {
        self.tracker.reset(self.objectives());
        self.last_objective_location = None;
    }

    /// Record a sighting (NONE → SEEN only).
    pub(crate) fn mark_seen(&mut self, signature: &BlockSignature, at: Vec3, notifier: &mut Notifier) -> Option<Vec3> {
        let change = self.tracker.mark_seen(signature, at)?;
        self.apply_changes(vec![change], notifier)
    }

    /// Re-derive every objective. Returns the last changed location.
    pub(crate) fn evaluate_objectives(
        &mut self,
        host: &dyn WorldHost,
        players: &BTreeMap<PlayerId, PlayerRecord>,
        notifier: &mut Notifier,
    ) -> Option<Vec3> {
        let present: Vec<&PlayerRecord> = self
            .members
            .iter()
            .filter_map(|id| players.get(id))
            .filter(|p| p.online)
            .collect();

        let changes = self.tracker.evaluate(
            &self.win_conditions,
            |wc| find_placed(wc, |pos| host.block_at(pos)),
            |sig| present.iter().find(|p| p.carries(sig)).map(|p| p.position),
        );
        self.apply_changes(changes, notifier)
    }

    fn apply_changes(&mut self, changes: Vec<ObjectiveChange>, notifier: &mut Notifier) -> Option<Vec3> {
        let mut last = None;
        for change in changes {
            debug!(team = %self.name, signature = %change.signature, from = %change.from, to = %change.to, "Objective state changed");
            notifier.emit(NotificationData::ObjectiveState {
                team: self.display_name().to_string(),
                signature: change.signature.to_string(),
                status: change.to,
            });
            if change.location.is_some() {
                last = change.location;
            }
        }
        if last.is_some() {
            self.last_objective_location = last;
        }
        last
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::BlockPos;
    use crate::game::events::MemorySink;
    use crate::game::player::PlayerSession;
    use crate::game::world::SimulatedWorld;
    use crate::region::RegionFlag;

    fn notifier() -> (Notifier, MemorySink) {
        let sink = MemorySink::new();
        (Notifier::new(Box::new(sink.clone())), sink)
    }

    fn record(byte: u8, name: &str) -> PlayerRecord {
        PlayerRecord::new(&PlayerSession::new(PlayerId::new([byte; 16]), name), Vec3::ZERO)
    }

    fn flag() -> BlockSignature {
        BlockSignature::material("flag")
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(TeamColor::parse("dark_blue"), TeamColor::DarkBlue);
        assert_eq!(TeamColor::parse("Light Purple"), TeamColor::LightPurple);
        assert_eq!(TeamColor::parse("mauve"), TeamColor::Reset);
    }

    #[test]
    fn test_identity() {
        let (mut n, sink) = notifier();
        let mut team = Team::new(TeamId(1), "Red Team");
        assert_eq!(team.tag(), "redteam");
        assert!(team.matches("RED"));

        team.set_custom_name(Some("Crimson Tide"), &mut n);
        assert_eq!(team.display_name(), "Crimson Tide");
        assert_eq!(team.tag(), "crimsontide");
        assert!(team.matches("tide"));
        assert!(team.matches("red"));
        assert_eq!(sink.lines(), vec!["team Red Team name Crimson Tide"]);
    }

    #[test]
    fn test_roster_changes_unready() {
        let (mut n, sink) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        let alice = record(1, "alice");

        team.add_expected("Alice");
        assert!(!team.is_empty());
        assert!(!team.can_start());

        assert!(team.add_member(&alice, &mut n));
        assert!(!team.add_member(&alice, &mut n));
        assert!(team.expected_players().is_empty());

        team.set_ready(true, &mut n);
        assert!(team.can_start());

        assert!(team.remove_member(&alice, &mut n));
        assert!(!team.is_ready());
        assert_eq!(
            sink.lines(),
            vec!["team Red player +alice", "team Red ready", "team Red notready", "team Red player -alice"]
        );
    }

    #[test]
    fn test_is_full_only_with_cap() {
        let (mut n, _) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        team.add_member(&record(1, "a"), &mut n);
        assert!(!team.is_full());
        team.set_max_size(1);
        assert!(team.is_full());
    }

    #[test]
    fn test_find_member() {
        let (mut n, _) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        let players: BTreeMap<PlayerId, PlayerRecord> = [record(1, "alice"), record(2, "alicia"), record(3, "bob")]
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        for p in players.values().take(2) {
            team.add_member(p, &mut n);
        }

        assert_eq!(team.find_member(&players, "ali"), Some(PlayerId::new([1; 16])));
        assert_eq!(team.find_member(&players, "ICIA"), Some(PlayerId::new([2; 16])));
        assert_eq!(team.find_member(&players, "bob"), None);
    }

    #[test]
    fn test_regions_are_owned() {
        let mut team = Team::new(TeamId(3), "Blue");
        let mut zone = Region::cuboid(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        zone.toggle(RegionFlag::Safe);
        team.add_region(zone);

        assert!(team.regions()[0].is_owner(TeamId(3)));
        assert!(team.check_position(None, Vec3::new(10.3, 5.0, 5.0)));
        assert!(!team.check_position(None, Vec3::new(10.4, 5.0, 5.0)));
        assert!(team.can_build(None, Vec3::new(5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_spawn_fallback() {
        let mut team = Team::new(TeamId(1), "Red");
        let world_spawn = Vec3::new(0.0, 64.0, 0.0);
        assert_eq!(team.spawn_location(world_spawn), world_spawn);
        team.set_spawn(Some(Vec3::new(5.0, 70.0, 5.0)));
        assert_eq!(team.spawn_location(world_spawn), Vec3::new(5.0, 70.0, 5.0));
    }

    #[test]
    fn test_win_conditions_dedupe_and_announce() {
        let (mut n, sink) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        let a = WinCondition::new(BlockPos::new(0, 64, 0), flag(), 0);
        let b = WinCondition::new(BlockPos::new(4, 64, 0), flag(), 0);
        let air = WinCondition::new(BlockPos::new(8, 64, 0), BlockSignature::material("air"), 0);

        assert!(team.add_win_condition(a.clone(), false, &mut n));
        assert!(!team.add_win_condition(a, false, &mut n));
        assert!(team.add_win_condition(b, false, &mut n));
        assert!(team.add_win_condition(air, false, &mut n));

        assert_eq!(team.win_conditions().len(), 3);
        assert_eq!(team.objectives().len(), 1);
        assert_eq!(sink.lines(), vec!["team Red obj +flag"]);
        assert!(!team.tracker().is_tracking(&flag()));
    }

    #[test]
    fn test_objective_added_while_playing_is_tracked() {
        let (mut n, _) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        team.reset_objectives();
        team.add_win_condition(WinCondition::new(BlockPos::new(0, 64, 0), flag(), 0), true, &mut n);
        assert!(team.tracker().is_tracking(&flag()));
        assert_eq!(team.objective_status(&flag()), GoalStatus::None);
    }

    #[test]
    fn test_victory_monument_location() {
        let (mut n, _) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        assert!(team.victory_monument_location().is_none());
        team.add_win_condition(WinCondition::new(BlockPos::new(0, 64, 0), flag(), 0), false, &mut n);
        team.add_win_condition(
            WinCondition::new(BlockPos::new(4, 64, 2), BlockSignature::material("gem"), 0),
            false,
            &mut n,
        );
        assert_eq!(team.victory_monument_location(), Some(Vec3::new(2.5, 64.5, 1.5)));
    }

    #[test]
    fn test_flag_carried_then_placed() {
        let (mut n, sink) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        let target = BlockPos::new(0, 64, 0);
        team.add_win_condition(WinCondition::new(target, flag(), 2), false, &mut n);
        team.reset_objectives();

        let mut carrier = record(1, "alice");
        carrier.position = target.center() + Vec3::new(1.0, 0.0, 0.0);
        carrier.set_carrying([flag()].into());
        team.add_member(&carrier, &mut n);
        let mut players = BTreeMap::new();
        players.insert(carrier.id, carrier.clone());

        let mut world = SimulatedWorld::new(Vec3::ZERO);
        team.evaluate_objectives(&world, &players, &mut n);
        assert_eq!(team.objective_status(&flag()), GoalStatus::Carrying);

        world.set_block(target.offset(1, 0, 0), Some(flag()));
        team.evaluate_objectives(&world, &players, &mut n);
        assert_eq!(team.objective_status(&flag()), GoalStatus::Placed);
        assert_eq!(team.last_objective_location(), Some(target.offset(1, 0, 0).center()));

        // Carrier drops the spare elsewhere
        if let Some(p) = players.get_mut(&carrier.id) {
            p.set_carrying(BTreeSet::new());
        }
        team.evaluate_objectives(&world, &players, &mut n);
        assert_eq!(team.objective_status(&flag()), GoalStatus::Placed);

        let states: Vec<String> = sink.lines().into_iter().filter(|l| l.contains("state")).collect();
        assert_eq!(states, vec!["team Red state flag carry", "team Red state flag vm"]);
    }

    #[test]
    fn test_offline_members_do_not_carry() {
        let (mut n, _) = notifier();
        let mut team = Team::new(TeamId(1), "Red");
        team.add_win_condition(WinCondition::new(BlockPos::new(0, 64, 0), flag(), 0), false, &mut n);
        team.reset_objectives();

        let mut carrier = record(1, "alice");
        carrier.set_carrying([flag()].into());
        carrier.online = false;
        team.add_member(&carrier, &mut n);
        let players: BTreeMap<_, _> = [(carrier.id, carrier)].into();

        team.evaluate_objectives(&SimulatedWorld::default(), &players, &mut n);
        assert_eq!(team.objective_status(&flag()), GoalStatus::None);
    }

    #[test]
    fn test_swap_roster_is_involution() {
        let (mut n, _) = notifier();
        let mut red = Team::new(TeamId(1), "Red");
        let mut blue = Team::new(TeamId(2), "Blue");
        red.add_member(&record(1, "a"), &mut n);
        red.set_custom_name(Some("Rockets"), &mut n);
        blue.add_expected("zed");

        red.swap_roster(&mut blue);
        assert!(blue.has_member(PlayerId::new([1; 16])));
        assert_eq!(blue.display_name(), "Rockets");
        assert_eq!(red.display_name(), "Red");
        assert!(red.expected_players().contains("zed"));

        red.swap_roster(&mut blue);
        assert!(red.has_member(PlayerId::new([1; 16])));
        assert_eq!(red.display_name(), "Rockets");
        assert!(blue.custom_name().is_none());
    }
}
