//! Match State
//!
//! The top-level state machine for one refereed world. Owns teams, player
//! records, the start region and start triggers, and gates every roster and
//! configuration edit on the lifecycle status.
//!
//! Uses BTreeMap throughout so notifications come out in a stable order.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::config::MatchSettings;
use crate::core::ids::{PlayerId, TeamId, WorldId};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::{BlockPos, Vec3};
use crate::game::events::{NotificationData, NotificationSink, Notifier, TracingSink};
use crate::game::objective::{BlockSignature, WinCondition};
use crate::game::player::{GameMode, PlayerRecord, PlayerSession, MAX_HEALTH};
use crate::game::status::MatchStatus;
use crate::game::team::{Team, TeamColor};
use crate::game::world::WorldHost;
use crate::region::{Cuboid, Region};
use crate::{DEFAULT_INEXACT_RANGE, DEFAULT_START_TIME, SNEAK_DISTANCE};

/// Map name used when the document has none.
pub const UNTITLED_MAP: &str = "<Untitled>";

// =============================================================================
// ERRORS
// =============================================================================

/// Rejected match operations. A rejection never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefereeError {
    /// Gated operation attempted after the match started.
    #[error("Match in progress")]
    MatchInProgress,

    /// Operation needs a match in progress.
    #[error("Match not in progress")]
    MatchNotInProgress,

    /// Operation not valid in the current status.
    #[error("Invalid match state: {0}")]
    InvalidState(MatchStatus),

    /// Session uses a disallowed client.
    #[error("Client modifications are not allowed")]
    ModifiedClient,

    /// Manual-roster cap reached.
    #[error("Team is full")]
    TeamFull,

    /// No such team in this match.
    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    /// No such player in this match.
    #[error("Player not found")]
    PlayerNotFound,

    /// Team switch with itself.
    #[error("Cannot switch a team with itself")]
    SameTeam,

    /// Match has no teams.
    #[error("Match has no teams")]
    NoTeams,

    /// Start requested before every team is ready.
    #[error("Teams not ready")]
    TeamsNotReady,

    /// No start trigger at this location.
    #[error("No start trigger at {0}")]
    UnknownTrigger(BlockPos),
}

/// Result alias for match operations.
pub type RefereeResult<T> = Result<T, RefereeError>;

// =============================================================================
// SUPPORTING TYPES
// =============================================================================

/// A physical start mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartTrigger {
    /// Mechanism block
    pub location: BlockPos,
    /// Powered state that counts as actuated
    pub state: bool,
    /// Currently in its target state
    pub actuated: bool,
}

/// Overrides for `Match::join`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinOptions {
    /// Ignore status gating and roster caps
    pub force: bool,
    /// Issued by a referee (allows instrumented clients)
    pub by_referee: bool,
}

impl JoinOptions {
    /// Forced join.
    pub fn forced() -> Self {
        Self { force: true, by_referee: false }
    }

    /// Join issued by a referee.
    pub fn referee() -> Self {
        Self { force: false, by_referee: true }
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// One refereed match bound to one world.
#[derive(Debug)]
pub struct Match {
    /// World this match referees
    world_id: WorldId,

    /// Display name of the map
    map_name: String,

    /// Lifecycle status
    status: MatchStatus,

    /// Teams by id
    teams: BTreeMap<TeamId, Team>,

    /// Next team id to hand out
    next_team_id: u16,

    /// Every player seen in the world
    players: BTreeMap<PlayerId, PlayerRecord>,

    /// Online players without a team
    spectators: BTreeSet<PlayerId>,

    /// Players with referee rights
    referees: BTreeSet<PlayerId>,

    /// Spawn area; permanent no-build zone
    start_region: Option<Region>,

    /// Start mechanisms by location
    start_triggers: BTreeMap<BlockPos, StartTrigger>,

    /// World time set on entering PLAYING
    start_time: i64,

    /// Default win-condition tolerance
    inexact_range: u32,

    /// Friendly fire allowed
    allow_friendly_fire: bool,

    /// Remaining countdown ticks, when armed
    countdown: Option<u32>,

    /// Per-match settings
    settings: MatchSettings,

    /// Ticks processed
    tick: u64,

    /// Balancing RNG
    rng: DeterministicRng,

    /// Where any team's objective state last changed
    last_objective_location: Option<Vec3>,

    /// Recorded result
    winner: Option<TeamId>,

    /// Notification output
    notifier: Notifier,
}

impl Match {
    /// Create an idle match logging notifications through tracing.
    pub fn new(world_id: WorldId, settings: MatchSettings) -> Self {
        Self::with_sink(world_id, settings, Box::new(TracingSink))
    }

    /// Create an idle match with a notification sink. A zero objective
    /// interval is raised to one tick.
    pub fn with_sink(world_id: WorldId, mut settings: MatchSettings, sink: Box<dyn NotificationSink>) -> Self {
        settings.objective_interval = settings.objective_interval.max(1);
        let rng = match settings.rng_seed {
            Some(seed) => DeterministicRng::new(seed),
            None => DeterministicRng::for_world(world_id.as_bytes()),
        };

        Self {
            world_id,
            map_name: UNTITLED_MAP.to_string(),
            status: MatchStatus::Idle,
            teams: BTreeMap::new(),
            next_team_id: 1,
            players: BTreeMap::new(),
            spectators: BTreeSet::new(),
            referees: BTreeSet::new(),
            start_region: None,
            start_triggers: BTreeMap::new(),
            start_time: DEFAULT_START_TIME,
            inexact_range: DEFAULT_INEXACT_RANGE,
            allow_friendly_fire: false,
            countdown: None,
            settings,
            tick: 0,
            rng,
            last_objective_location: None,
            winner: None,
            notifier: Notifier::new(sink),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// World this match referees.
    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    /// Map display name.
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Set the map display name.
    pub fn set_map_name(&mut self, name: &str) {
        self.map_name = name.to_string();
    }

    /// Lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Per-match settings.
    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Ticks processed.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Remaining countdown ticks, when armed.
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown
    }

    /// World time set on entering PLAYING.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Set the start world time.
    pub fn set_start_time(&mut self, ticks: i64) {
        self.start_time = ticks;
    }

    /// Default win-condition tolerance.
    pub fn inexact_range(&self) -> u32 {
        self.inexact_range
    }

    /// Set the default win-condition tolerance.
    pub fn set_inexact_range(&mut self, range: u32) {
        self.inexact_range = range;
    }

    /// Is friendly fire allowed?
    pub fn allow_friendly_fire(&self) -> bool {
        self.allow_friendly_fire
    }

    /// Allow or forbid friendly fire.
    pub fn set_allow_friendly_fire(&mut self, allow: bool) {
        self.allow_friendly_fire = allow;
    }

    /// Recorded result.
    pub fn winner(&self) -> Option<TeamId> {
        self.winner
    }

    /// Where any team's objective state last changed.
    pub fn last_objective_location(&self) -> Option<Vec3> {
        self.last_objective_location
    }

    /// Teams in id order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// Number of teams.
    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Look up a team.
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    /// Find a team by name: exact (case-insensitive) first, then substring.
    pub fn find_team(&self, needle: &str) -> Option<TeamId> {
        self.teams
            .values()
            .find(|t| t.name().eq_ignore_ascii_case(needle) || t.display_name().eq_ignore_ascii_case(needle))
            .or_else(|| self.teams.values().find(|t| t.matches(needle)))
            .map(Team::id)
    }

    /// Every player seen in the world.
    pub fn players(&self) -> &BTreeMap<PlayerId, PlayerRecord> {
        &self.players
    }

    /// Look up a player record.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    /// Team a player belongs to.
    pub fn player_team(&self, id: PlayerId) -> Option<&Team> {
        self.players.get(&id)?.team.and_then(|t| self.teams.get(&t))
    }

    /// Online players without a team.
    pub fn spectators(&self) -> &BTreeSet<PlayerId> {
        &self.spectators
    }

    /// Is this player a referee?
    pub fn is_referee(&self, id: PlayerId) -> bool {
        self.referees.contains(&id)
    }

    /// Grant referee rights.
    pub fn add_referee(&mut self, id: PlayerId) {
        self.referees.insert(id);
    }

    /// Start mechanisms by location.
    pub fn start_triggers(&self) -> &BTreeMap<BlockPos, StartTrigger> {
        &self.start_triggers
    }

    /// Spawn area, if configured.
    pub fn start_region(&self) -> Option<&Region> {
        self.start_region.as_ref()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn set_status(&mut self, to: MatchStatus) {
        if self.status == to {
            return;
        }
        let from = self.status;
        self.status = to;
        info!(world = %self.world_id, %from, %to, "Match status changed");
        self.notifier.emit(NotificationData::StatusChanged { from, to });
    }

    /// Advance the tick counter stamped on notifications.
    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.notifier.set_tick(self.tick);
        self.tick
    }

    /// IDLE → SETUP once configuration is in place.
    pub fn begin_setup(&mut self) -> RefereeResult<()> {
        if self.status != MatchStatus::Idle {
            return Err(RefereeError::InvalidState(self.status));
        }
        if self.teams.is_empty() {
            return Err(RefereeError::NoTeams);
        }
        self.set_status(MatchStatus::Setup);
        self.check_teams_ready();
        Ok(())
    }

    /// Recompute SETUP ↔ READY from team readiness.
    ///
    /// Every team needs at least one confirmed member and its ready flag. A
    /// team dropping out during COUNTDOWN cancels the countdown.
    pub fn check_teams_ready(&mut self) {
        let all_ready = !self.teams.is_empty() && self.teams.values().all(Team::can_start);

        match self.status {
            MatchStatus::Setup if all_ready => self.set_status(MatchStatus::Ready),
            MatchStatus::Ready if !all_ready => self.set_status(MatchStatus::Setup),
            MatchStatus::Countdown if !all_ready => {
                self.cancel_countdown();
                self.set_status(MatchStatus::Setup);
            }
            _ => {}
        }
    }

    /// Explicit start command: READY → COUNTDOWN.
    pub fn start_command(&mut self) -> RefereeResult<()> {
        match self.status {
            MatchStatus::Ready | MatchStatus::Countdown => self.start_countdown(),
            MatchStatus::Setup => Err(RefereeError::TeamsNotReady),
            status => Err(RefereeError::InvalidState(status)),
        }
    }

    /// Arm the countdown, cancelling any running one first.
    pub fn start_countdown(&mut self) -> RefereeResult<()> {
        if !matches!(self.status, MatchStatus::Ready | MatchStatus::Countdown) {
            return Err(RefereeError::InvalidState(self.status));
        }

        self.cancel_countdown();
        self.countdown = Some(self.settings.countdown_ticks());
        self.set_status(MatchStatus::Countdown);
        self.notifier.emit(NotificationData::CountdownStarted {
            seconds: self.settings.countdown_seconds,
        });
        Ok(())
    }

    /// Stop a running countdown and return to READY. No-op when idle.
    pub fn cancel_countdown(&mut self) {
        if self.countdown.take().is_none() {
            return;
        }
        debug!(world = %self.world_id, "Countdown cancelled");
        self.notifier.emit(NotificationData::CountdownCancelled);
        if self.status == MatchStatus::Countdown {
            self.set_status(MatchStatus::Ready);
        }
    }

    /// One countdown tick. Returns true when play started.
    pub(crate) fn advance_countdown(&mut self, host: &mut dyn WorldHost) -> bool {
        if self.status != MatchStatus::Countdown {
            return false;
        }
        match self.countdown {
            Some(remaining) if remaining > 1 => {
                self.countdown = Some(remaining - 1);
                false
            }
            Some(_) => {
                self.start_playing(host);
                true
            }
            None => false,
        }
    }

    /// Enter PLAYING: set world time, drive mechanisms, heal members and
    /// take the first objective snapshot.
    pub fn start_playing(&mut self, host: &mut dyn WorldHost) {
        self.countdown = None;
        self.set_status(MatchStatus::Playing);
        host.set_time(self.start_time);

        for trigger in self.start_triggers.values() {
            host.set_mechanism(trigger.location, trigger.state);
        }

        let team_ids: Vec<TeamId> = self.teams.keys().copied().collect();
        for id in team_ids {
            self.start_team(host, id);
        }

        info!(world = %self.world_id, teams = self.teams.len(), "Match started");
    }

    fn start_team(&mut self, host: &mut dyn WorldHost, id: TeamId) {
        let Some(team) = self.teams.get_mut(&id) else { return };
        team.reset_objectives();

        let members: Vec<PlayerId> = team.members().iter().copied().collect();
        for player in members {
            let Some(record) = self.players.get_mut(&player) else { continue };
            if !record.online {
                continue;
            }
            host.heal(player);
            record.health = MAX_HEALTH;
            let carrying = host.carried_items(player);
            self.apply_carrying(player, carrying);
        }

        if let Some(team) = self.teams.get_mut(&id) {
            if let Some(at) = team.evaluate_objectives(&*host, &self.players, &mut self.notifier) {
                self.last_objective_location = Some(at);
            }
        }
    }

    /// PLAYING → FINISHED with an externally decided result.
    pub fn finish(&mut self, winner: Option<TeamId>) -> RefereeResult<()> {
        if self.status != MatchStatus::Playing {
            return Err(RefereeError::MatchNotInProgress);
        }
        if let Some(id) = winner {
            if !self.teams.contains_key(&id) {
                return Err(RefereeError::TeamNotFound(id));
            }
        }

        self.winner = winner;
        self.set_status(MatchStatus::Finished);
        let winner_name = winner.and_then(|id| self.teams.get(&id)).map(|t| t.display_name().to_string());
        info!(world = %self.world_id, winner = ?winner_name, "Match finished");
        self.notifier.emit(NotificationData::MatchEnded { winner: winner_name });
        Ok(())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    fn require_before_match(&self, force: bool) -> RefereeResult<()> {
        if force || self.status.is_before_match() {
            Ok(())
        } else {
            Err(RefereeError::MatchInProgress)
        }
    }

    fn team_mut(&mut self, id: TeamId) -> RefereeResult<&mut Team> {
        self.teams.get_mut(&id).ok_or(RefereeError::TeamNotFound(id))
    }

    /// Create a team.
    pub fn add_team(&mut self, name: &str) -> RefereeResult<TeamId> {
        self.require_before_match(false)?;

        let id = TeamId(self.next_team_id);
        self.next_team_id += 1;
        self.teams.insert(id, Team::new(id, name));
        self.notifier.emit(NotificationData::TeamInit { team: name.to_string() });
        debug!(world = %self.world_id, team = name, "Team added");
        Ok(id)
    }

    /// Set or clear a team's display override.
    pub fn rename_team(&mut self, id: TeamId, name: Option<&str>) -> RefereeResult<()> {
        let team = self.teams.get_mut(&id).ok_or(RefereeError::TeamNotFound(id))?;
        team.set_custom_name(name, &mut self.notifier);
        Ok(())
    }

    /// Set a team's color.
    pub fn set_team_color(&mut self, id: TeamId, color: TeamColor) -> RefereeResult<()> {
        let team = self.teams.get_mut(&id).ok_or(RefereeError::TeamNotFound(id))?;
        team.set_color(color, &mut self.notifier);
        Ok(())
    }

    /// Set a team's manual-roster cap.
    pub fn set_team_max_size(&mut self, id: TeamId, max_size: u32) -> RefereeResult<()> {
        self.team_mut(id)?.set_max_size(max_size);
        Ok(())
    }

    /// Set a team's spawn.
    pub fn set_team_spawn(&mut self, id: TeamId, spawn: Option<Vec3>, force: bool) -> RefereeResult<()> {
        self.require_before_match(force)?;
        self.team_mut(id)?.set_spawn(spawn);
        Ok(())
    }

    /// Add a win-condition. Returns false for duplicates.
    pub fn add_win_condition(&mut self, id: TeamId, wc: WinCondition, force: bool) -> RefereeResult<bool> {
        self.require_before_match(force)?;
        let playing = self.status.in_progress();
        let team = self.teams.get_mut(&id).ok_or(RefereeError::TeamNotFound(id))?;
        Ok(team.add_win_condition(wc, playing, &mut self.notifier))
    }

    /// Give a team a region.
    pub fn add_team_region(&mut self, id: TeamId, region: Region) -> RefereeResult<()> {
        self.team_mut(id)?.add_region(region);
        Ok(())
    }

    /// Expect a player (by name) on a team.
    pub fn add_expected_player(&mut self, id: TeamId, name: &str) -> RefereeResult<bool> {
        Ok(self.team_mut(id)?.add_expected(name))
    }

    /// Set or clear the start region.
    pub fn set_start_region(&mut self, region: Option<Region>) {
        self.start_region = region;
    }

    /// Is the point inside the start region?
    pub fn in_start_region(&self, p: Vec3) -> bool {
        self.start_region.as_ref().is_some_and(|r| r.contains(p))
    }

    /// Register a start mechanism.
    pub fn add_start_trigger(&mut self, location: BlockPos, state: bool) -> RefereeResult<()> {
        self.require_before_match(false)?;
        self.start_triggers.insert(location, StartTrigger { location, state, actuated: false });
        self.notifier.emit(NotificationData::StartTriggerAdded {
            location: location.to_coords(),
            state,
        });
        Ok(())
    }

    /// A start mechanism changed state. Returns true when it moved the
    /// lifecycle: fires play while counting down, arms the countdown when
    /// it was the last unactuated trigger in READY.
    pub fn actuate_trigger(&mut self, host: &mut dyn WorldHost, location: BlockPos, powered: bool) -> RefereeResult<bool> {
        let trigger = self
            .start_triggers
            .get_mut(&location)
            .ok_or(RefereeError::UnknownTrigger(location))?;
        trigger.actuated = powered == trigger.state;
        let actuated = trigger.actuated;

        match self.status {
            MatchStatus::Countdown if actuated => {
                self.start_playing(host);
                Ok(true)
            }
            MatchStatus::Ready if self.start_triggers.values().all(|t| t.actuated) => {
                self.start_countdown()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Roster
    // =========================================================================

    /// A player session appeared in the world.
    pub fn player_connected(&mut self, session: &PlayerSession, position: Vec3) {
        match self.players.get_mut(&session.id) {
            Some(record) => {
                record.name = session.name.clone();
                record.instrumented_client = session.instrumented_client;
                record.online = true;
                record.position = position;
            }
            None => {
                self.players.insert(session.id, PlayerRecord::new(session, position));
            }
        }
        self.notifier.emit(NotificationData::PlayerLogin { player: session.name.clone() });
        self.recompute_spectators();
    }

    /// A player session left the world. Team membership is kept.
    pub fn player_disconnected(&mut self, id: PlayerId) {
        if let Some(record) = self.players.get_mut(&id) {
            record.online = false;
        }
        self.recompute_spectators();
    }

    /// Put a player on a team. Returns false if already a member.
    pub fn join(
        &mut self,
        host: &mut dyn WorldHost,
        player: PlayerId,
        team: TeamId,
        options: JoinOptions,
    ) -> RefereeResult<bool> {
        let record = self.players.get(&player).ok_or(RefereeError::PlayerNotFound)?;
        if record.instrumented_client && !options.by_referee {
            warn!(world = %self.world_id, player = %record.name, "Rejected join from modified client");
            return Err(RefereeError::ModifiedClient);
        }
        let target = self.teams.get(&team).ok_or(RefereeError::TeamNotFound(team))?;
        if record.team == Some(team) {
            return Ok(false);
        }
        self.require_before_match(options.force)?;
        if self.settings.manual_roster && !options.force && target.is_full() {
            return Err(RefereeError::TeamFull);
        }

        let previous = record.team;
        if let Some(record) = self.players.get(&player) {
            if let Some(old) = previous.and_then(|id| self.teams.get_mut(&id)) {
                old.remove_member(record, &mut self.notifier);
            }
            if let Some(new) = self.teams.get_mut(&team) {
                new.add_member(record, &mut self.notifier);
            }
        }
        if let Some(record) = self.players.get_mut(&player) {
            record.team = Some(team);
        }

        if self.status.is_before_match() {
            let spawn = self
                .teams
                .get(&team)
                .map_or(host.world_spawn(), |t| t.spawn_location(host.world_spawn()));
            host.teleport(player, spawn);
            if let Some(record) = self.players.get_mut(&player) {
                record.position = spawn;
            }
        }
        host.set_game_mode(player, GameMode::Survival);

        info!(world = %self.world_id, %team, "Player joined team");
        self.recompute_spectators();
        self.check_teams_ready();
        Ok(true)
    }

    /// Take a player off their team. Returns false if on no team.
    pub fn leave(&mut self, host: &mut dyn WorldHost, player: PlayerId, force: bool) -> RefereeResult<bool> {
        let record = self.players.get(&player).ok_or(RefereeError::PlayerNotFound)?;
        let Some(team) = record.team else { return Ok(false) };
        self.require_before_match(force)?;

        if let (Some(record), Some(old)) = (self.players.get(&player), self.teams.get_mut(&team)) {
            old.remove_member(record, &mut self.notifier);
        }
        let spawn = host.world_spawn();
        host.teleport(player, spawn);
        if let Some(record) = self.players.get_mut(&player) {
            record.team = None;
            record.position = spawn;
        }

        info!(world = %self.world_id, %team, "Player left team");
        self.recompute_spectators();
        self.check_teams_ready();
        Ok(true)
    }

    /// Mark a team ready or not ready.
    pub fn set_team_ready(&mut self, id: TeamId, ready: bool) -> RefereeResult<()> {
        if ready && !self.status.is_before_match() {
            return Err(RefereeError::MatchInProgress);
        }
        let team = self.teams.get_mut(&id).ok_or(RefereeError::TeamNotFound(id))?;
        team.set_ready(ready, &mut self.notifier);
        self.check_teams_ready();
        Ok(())
    }

    /// Teams tied at the smallest live roster, one chosen at random.
    pub fn pick_balanced_team(&mut self) -> Option<TeamId> {
        let min = self.teams.values().map(Team::member_count).min()?;
        let tied: Vec<TeamId> = self
            .teams
            .values()
            .filter(|t| t.member_count() == min)
            .map(Team::id)
            .collect();
        self.rng.choose(&tied).copied()
    }

    /// Put a team-less, non-referee player on the balanced team.
    pub fn auto_assign(&mut self, host: &mut dyn WorldHost, player: PlayerId) -> RefereeResult<Option<TeamId>> {
        let record = self.players.get(&player).ok_or(RefereeError::PlayerNotFound)?;
        if record.team.is_some() || self.referees.contains(&player) {
            return Ok(None);
        }
        let team = self.pick_balanced_team().ok_or(RefereeError::NoTeams)?;
        self.join(host, player, team, JoinOptions::default())?;
        Ok(Some(team))
    }

    /// Swap two teams' rosters and display overrides.
    pub fn switch_teams(&mut self, a: TeamId, b: TeamId) -> RefereeResult<()> {
        if a == b {
            return Err(RefereeError::SameTeam);
        }
        if !self.teams.contains_key(&a) {
            return Err(RefereeError::TeamNotFound(a));
        }
        let mut second = self.teams.remove(&b).ok_or(RefereeError::TeamNotFound(b))?;

        if let Some(first) = self.teams.get_mut(&a) {
            first.swap_roster(&mut second);
            for id in first.members() {
                if let Some(record) = self.players.get_mut(id) {
                    record.team = Some(a);
                }
            }
        }
        for id in second.members() {
            if let Some(record) = self.players.get_mut(id) {
                record.team = Some(b);
            }
        }
        self.teams.insert(b, second);

        for id in [a, b] {
            if let Some(team) = self.teams.get_mut(&id) {
                team.set_ready(false, &mut self.notifier);
                self.notifier.emit(NotificationData::TeamRenamed {
                    team: team.name().to_string(),
                    name: team.display_name().to_string(),
                });
            }
        }

        info!(world = %self.world_id, %a, %b, "Teams switched");
        self.check_teams_ready();
        Ok(())
    }

    fn recompute_spectators(&mut self) {
        self.spectators = self
            .players
            .values()
            .filter(|p| p.online && p.team.is_none())
            .map(|p| p.id)
            .collect();
    }

    // =========================================================================
    // Objectives and observations
    // =========================================================================

    /// Re-evaluate every team's objectives (PLAYING only).
    pub fn update_objectives(&mut self, host: &dyn WorldHost) {
        if !self.status.in_progress() {
            return;
        }
        for team in self.teams.values_mut() {
            if let Some(at) = team.evaluate_objectives(host, &self.players, &mut self.notifier) {
                self.last_objective_location = Some(at);
            }
        }
    }

    fn apply_carrying(&mut self, player: PlayerId, carrying: BTreeSet<BlockSignature>) -> bool {
        let Some(record) = self.players.get_mut(&player) else { return false };
        let (gained, lost) = record.set_carrying(carrying);
        let name = record.name.clone();
        let objectives = record
            .team
            .and_then(|t| self.teams.get(&t))
            .map(Team::objectives)
            .unwrap_or_default();

        let relevant = |sig: &BlockSignature| objectives.iter().any(|o| o.matches(sig));
        let mut changed = false;
        for (sigs, gain) in [(gained, true), (lost, false)] {
            for sig in sigs.into_iter().filter(|s| relevant(s)) {
                changed = true;
                self.notifier.emit(NotificationData::PlayerCarrying {
                    player: name.clone(),
                    signature: sig.to_string(),
                    gained: gain,
                });
            }
        }
        changed
    }

    /// A player's inventory changed. Returns true if an objective item
    /// was gained or lost.
    pub fn observe_carrying(&mut self, player: PlayerId, carrying: BTreeSet<BlockSignature>) -> bool {
        self.apply_carrying(player, carrying)
    }

    /// A player's health or armor changed.
    pub fn observe_health(&mut self, player: PlayerId, health: u32, armor: u32) {
        let Some(record) = self.players.get_mut(&player) else { return };
        if record.health == health && record.armor == armor {
            return;
        }
        record.health = health;
        record.armor = armor;
        self.notifier.emit(NotificationData::PlayerHealth {
            player: record.name.clone(),
            health,
            armor,
        });
    }

    /// A player saw an objective. Raises NONE → SEEN for their team.
    pub fn observe_sighting(&mut self, player: PlayerId, signature: &BlockSignature, at: Vec3) {
        let Some(team_id) = self.players.get(&player).and_then(|p| p.team) else { return };
        if let Some(team) = self.teams.get_mut(&team_id) {
            if let Some(loc) = team.mark_seen(signature, at, &mut self.notifier) {
                self.last_objective_location = Some(loc);
            }
        }
    }

    /// A player moved. During PLAYING a team member moving somewhere its
    /// team cannot enter is sent back; returns false in that case.
    pub fn observe_move(&mut self, host: &mut dyn WorldHost, player: PlayerId, to: Vec3) -> bool {
        let Some(record) = self.players.get(&player) else { return false };

        let blocked = self.status.in_progress()
            && record
                .team
                .and_then(|t| self.teams.get(&t))
                .is_some_and(|t| !t.regions().is_empty() && !t.can_enter(self.start_region.as_ref(), to, SNEAK_DISTANCE));

        if blocked {
            let back = record.position;
            let name = record.name.clone();
            host.teleport(player, back);
            warn!(world = %self.world_id, player = %name, "Zone violation");
            self.notifier.emit(NotificationData::ZoneViolation { player: name, position: to.to_coords() });
            return false;
        }

        if let Some(record) = self.players.get_mut(&player) {
            record.position = to;
        }
        true
    }

    // =========================================================================
    // Spatial queries
    // =========================================================================

    /// May this player build at the point?
    pub fn can_build(&self, player: PlayerId, p: Vec3) -> bool {
        self.player_team(player)
            .is_some_and(|t| t.can_build(self.start_region.as_ref(), p))
    }

    /// May this player be at the point?
    pub fn can_enter(&self, player: PlayerId, p: Vec3, tolerance: f64) -> bool {
        self.player_team(player)
            .is_some_and(|t| t.can_enter(self.start_region.as_ref(), p, tolerance))
    }

    /// Box covering the start region and every team region.
    pub fn bounds(&self) -> Option<Cuboid> {
        self.teams
            .values()
            .flat_map(|t| t.regions())
            .map(Region::bounding_box)
            .chain(self.start_region.as_ref().map(Region::bounding_box))
            .reduce(Cuboid::combine)
    }
}

// =============================================================================
// TESTS
// =============================================================================
