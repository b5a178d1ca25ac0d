//! World Document
//!
//! The per-world `referee.yml` layout and its conversion to and from a
//! `Match`. Loading is lenient: a malformed entry is skipped with a
//! warning and the rest of the document still loads.

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Deserialize};
use serde_yaml::Value;
use tracing::warn;

use crate::config::{ConfigError, MatchSettings};
use crate::core::hash::{LayoutHash, LayoutHasher};
use crate::core::ids::WorldId;
use crate::core::vec3::{BlockPos, Vec3};
use crate::game::events::NotificationSink;
use crate::game::objective::WinCondition;
use crate::game::state::{Match, UNTITLED_MAP};
use crate::game::team::TeamColor;
use crate::region::RegionRegistry;
use crate::{DEFAULT_START_TIME, MAX_INEXACT_RANGE};

/// World ticks in a day.
const TICKS_PER_DAY: i64 = 24_000;

/// Offset between midnight and world tick zero.
const MIDNIGHT_TICKS: i64 = 18_000;

// =============================================================================
// LAYOUT
// =============================================================================

/// Root of a `referee.yml` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldDocument {
    /// Map metadata
    #[serde(default)]
    pub map: MapSection,

    /// Match layout
    #[serde(rename = "match", default)]
    pub game: MatchSection,
}

/// `map:` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSection {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `match:` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchSection {
    /// Team records, kept raw so one bad entry cannot fail the rest
    #[serde(default)]
    pub teams: Vec<Value>,

    /// `"<x,y,z>:<bool>"` start mechanisms
    #[serde(default)]
    pub start_mechanisms: Vec<String>,

    /// Start region description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_region: Option<String>,

    /// `HH:MM` or raw world ticks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Default win-condition tolerance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inexact_range: Option<u32>,

    /// Friendly fire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_ff: Option<bool>,
}

/// One entry of `match.teams`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TeamRecord {
    /// Internal name
    pub name: String,

    /// Chat color name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Manual-roster cap
    #[serde(default)]
    pub maxsize: u32,

    /// Custom spawn coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<String>,

    /// `"<x,y,z>:<signature>[:<radius>]"` entries
    #[serde(default)]
    pub win_condition: Vec<String>,

    /// Region descriptions
    #[serde(default)]
    pub regions: Vec<String>,
}

impl WorldDocument {
    /// Parse YAML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Render as YAML text.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Fingerprint of the layout.
    pub fn layout_hash(&self) -> LayoutHash {
        let mut hasher = LayoutHasher::for_world_document();
        hasher.update_opt_str(self.map.name.as_deref());

        let game = &self.game;
        hasher.update_u32(game.teams.len() as u32);
        for value in &game.teams {
            match serde_yaml::from_value::<TeamRecord>(value.clone()) {
                Ok(team) => {
                    hasher.update_bool(true);
                    hasher.update_str(&team.name);
                    hasher.update_opt_str(team.color.as_deref());
                    hasher.update_u32(team.maxsize);
                    hasher.update_opt_str(team.spawn.as_deref());
                    hasher.update_strs(&team.win_condition);
                    hasher.update_strs(&team.regions);
                }
                Err(_) => {
                    hasher.update_bool(false);
                    hasher.update_str(&format!("{:?}", value));
                }
            }
        }

        hasher.update_strs(&game.start_mechanisms);
        hasher.update_opt_str(game.start_region.as_deref());
        hasher.update_opt_str(game.start_time.as_deref());
        hasher.update_opt_str(game.inexact_range.map(|r| r.to_string()).as_deref());
        hasher.update_opt_str(game.allow_ff.map(|b| b.to_string()).as_deref());
        hasher.finalize()
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// A skipped or defaulted document entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadWarning {
    /// What went wrong
    pub message: String,
    /// Document path of the entry
    pub location: Option<String>,
}

impl LoadWarning {
    fn at(location: String, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

/// A loaded match plus everything that was skipped.
#[derive(Debug)]
pub struct LoadResult {
    /// Match in SETUP (or IDLE when the document has no teams)
    pub state: Match,
    /// Entries that were skipped
    pub warnings: Vec<LoadWarning>,
}

/// Build a match from a document.
pub fn load_match(
    doc: &WorldDocument,
    world_id: WorldId,
    settings: MatchSettings,
    registry: &RegionRegistry,
    sink: Box<dyn NotificationSink>,
) -> LoadResult {
    let mut m = Match::with_sink(world_id, settings, sink);
    let mut warnings = Vec::new();
    let game = &doc.game;

    m.set_map_name(doc.map.name.as_deref().unwrap_or(UNTITLED_MAP));
    match game.inexact_range {
        Some(range) if range > MAX_INEXACT_RANGE => warnings.push(LoadWarning::at(
            "match.inexact-range".into(),
            format!("range {} exceeds {}", range, MAX_INEXACT_RANGE),
        )),
        Some(range) => m.set_inexact_range(range),
        None => {}
    }
    m.set_allow_friendly_fire(game.allow_ff.unwrap_or(false));

    if let Some(text) = &game.start_time {
        match parse_start_time(text) {
            Some(ticks) => m.set_start_time(ticks),
            None => warnings.push(LoadWarning::at("match.start-time".into(), format!("unparseable time {:?}", text))),
        }
    }

    if let Some(desc) = &game.start_region {
        match registry.parse(desc) {
            Ok(region) => m.set_start_region(Some(region)),
            Err(e) => warnings.push(LoadWarning::at("match.start-region".into(), e.to_string())),
        }
    }

    for (i, value) in game.teams.iter().enumerate() {
        let location = format!("match.teams[{}]", i);
        match serde_yaml::from_value::<TeamRecord>(value.clone()) {
            Ok(record) => load_team(&mut m, &record, registry, &location, &mut warnings),
            Err(e) => warnings.push(LoadWarning::at(location, e.to_string())),
        }
    }

    for (i, entry) in game.start_mechanisms.iter().enumerate() {
        let location = format!("match.start-mechanisms[{}]", i);
        match parse_mechanism(entry) {
            Some((pos, state)) => {
                if let Err(e) = m.add_start_trigger(pos, state) {
                    warnings.push(LoadWarning::at(location, e.to_string()));
                }
            }
            None => warnings.push(LoadWarning::at(location, format!("malformed mechanism {:?}", entry))),
        }
    }

    if m.team_count() > 0 {
        if let Err(e) = m.begin_setup() {
            warnings.push(LoadWarning { message: e.to_string(), location: None });
        }
    }

    for w in &warnings {
        warn!(world = %world_id, location = ?w.location, "Skipped document entry: {}", w.message);
    }

    LoadResult { state: m, warnings }
}

fn load_team(
    m: &mut Match,
    record: &TeamRecord,
    registry: &RegionRegistry,
    location: &str,
    warnings: &mut Vec<LoadWarning>,
) {
    let id = match m.add_team(&record.name) {
        Ok(id) => id,
        Err(e) => {
            warnings.push(LoadWarning::at(location.to_string(), e.to_string()));
            return;
        }
    };

    // Team was just created in this match; the edits below cannot miss it
    let color = record.color.as_deref().map_or(TeamColor::Reset, TeamColor::parse);
    let _ = m.set_team_color(id, color);
    let _ = m.set_team_max_size(id, record.maxsize);

    if let Some(spawn) = &record.spawn {
        match Vec3::from_coords(spawn) {
            Some(p) => {
                let _ = m.set_team_spawn(id, Some(p), true);
            }
            None => warnings.push(LoadWarning::at(format!("{}.spawn", location), format!("bad coordinates {:?}", spawn))),
        }
    }

    for (i, desc) in record.regions.iter().enumerate() {
        match registry.parse(desc) {
            Ok(region) => {
                let _ = m.add_team_region(id, region);
            }
            Err(e) => warnings.push(LoadWarning::at(format!("{}.regions[{}]", location, i), e.to_string())),
        }
    }

    let default_radius = m.inexact_range();
    for (i, entry) in record.win_condition.iter().enumerate() {
        match WinCondition::parse(entry, default_radius) {
            Some(wc) => {
                let _ = m.add_win_condition(id, wc, true);
            }
            None => warnings.push(LoadWarning::at(
                format!("{}.win-condition[{}]", location, i),
                format!("malformed win-condition {:?}", entry),
            )),
        }
    }
}

fn parse_mechanism(entry: &str) -> Option<(BlockPos, bool)> {
    let (coords, state) = entry.rsplit_once(':')?;
    Some((BlockPos::from_coords(coords)?, state.trim().parse().ok()?))
}

// =============================================================================
// SAVING
// =============================================================================

/// Snapshot a match as a document. Teams come out in id order.
pub fn to_document(m: &Match) -> WorldDocument {
    let default_radius = m.inexact_range();
    let teams = m
        .teams()
        .map(|team| TeamRecord {
            name: team.name().to_string(),
            color: Some(team.color().name().to_string()),
            maxsize: team.max_size(),
            spawn: team.spawn().map(Vec3::to_coords),
            win_condition: team.win_conditions().iter().map(|wc| wc.to_entry(default_radius)).collect(),
            regions: team.regions().iter().map(|r| r.describe()).collect(),
        })
        .filter_map(|record| serde_yaml::to_value(record).ok())
        .collect();

    WorldDocument {
        map: MapSection {
            name: Some(m.map_name().to_string()),
        },
        game: MatchSection {
            teams,
            start_mechanisms: m
                .start_triggers()
                .values()
                .map(|t| format!("{}:{}", t.location.to_coords(), t.state))
                .collect(),
            start_region: m.start_region().map(|r| r.describe()),
            start_time: Some(format_start_time(m.start_time())),
            inexact_range: Some(m.inexact_range()),
            allow_ff: Some(m.allow_friendly_fire()),
        },
    }
}

// =============================================================================
// START TIME
// =============================================================================

/// Parse `HH:MM` (wall clock) or a raw tick count into world ticks.
pub fn parse_start_time(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(ticks) = text.parse::<i64>() {
        return Some(ticks.rem_euclid(TICKS_PER_DAY));
    }

    let time = NaiveTime::parse_from_str(text, "%H:%M").ok()?;
    let minutes = (time.minute() as f64 * 1000.0 / 60.0).round() as i64;
    Some((time.hour() as i64 * 1000 + minutes + MIDNIGHT_TICKS).rem_euclid(TICKS_PER_DAY))
}

/// Format world ticks as `HH:MM`.
pub fn format_start_time(ticks: i64) -> String {
    let since_midnight = (ticks + TICKS_PER_DAY - MIDNIGHT_TICKS).rem_euclid(TICKS_PER_DAY);
    let mut hours = since_midnight / 1000;
    let mut minutes = ((since_midnight % 1000) as f64 * 60.0 / 1000.0).round() as i64;
    if minutes == 60 {
        minutes = 0;
        hours = (hours + 1) % 24;
    }
    format!("{:02}:{:02}", hours, minutes)
}

/// Default start time as `HH:MM`.
pub fn default_start_time() -> String {
    format_start_time(DEFAULT_START_TIME)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::MemorySink;
    use crate::game::objective::BlockSignature;
    use crate::game::status::MatchStatus;
    use crate::DEFAULT_INEXACT_RANGE;

    const SAMPLE: &str = r#"
map:
  name: Castle Siege
match:
  teams:
    - name: Red
      color: dark_red
      maxsize: 4
      spawn: "10,64,10"
      win-condition:
        - "0,64,0:wool,14"
        - "2,64,0:gold_block:3"
      regions:
        - "-20,0,-20:20,128,20"
        - "point:0,64,0/n"
    - name: Blue
      color: BLUE
      win-condition:
        - "100,64,0:wool,11"
      regions:
        - "80,0,-20:120,128,20/b"
  start-mechanisms:
    - "50,64,0:true"
  start-region: "40,60,-5:60,70,5"
  start-time: "14:00"
  inexact-range: 1
  allow-ff: true
"#;

    fn load(doc: &WorldDocument) -> LoadResult {
        load_match(
            doc,
            WorldId::new([5; 16]),
            MatchSettings::default(),
            &RegionRegistry::default(),
            Box::new(MemorySink::new()),
        )
    }

    #[test]
    fn test_load_sample() {
        let doc = WorldDocument::parse(SAMPLE).unwrap();
        let result = load(&doc);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);

        let m = result.state;
        assert_eq!(m.status(), MatchStatus::Setup);
        assert_eq!(m.map_name(), "Castle Siege");
        assert_eq!(m.start_time(), 8000);
        assert_eq!(m.inexact_range(), 1);
        assert!(m.allow_friendly_fire());
        assert!(m.in_start_region(Vec3::new(50.0, 64.0, 0.0)));
        assert_eq!(m.start_triggers().len(), 1);

        let red = m.team(m.find_team("Red").unwrap()).unwrap();
        assert_eq!(red.color(), TeamColor::DarkRed);
        assert_eq!(red.max_size(), 4);
        assert_eq!(red.spawn(), Some(Vec3::new(10.0, 64.0, 10.0)));
        assert_eq!(red.regions().len(), 2);
        assert!(!red.regions()[1].can_enter());
        assert_eq!(red.win_conditions()[0].radius, 1);
        assert_eq!(red.win_conditions()[1].radius, 3);
        assert!(red.objectives().contains(&BlockSignature::new("wool", Some(14))));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let text = r#"
match:
  teams:
    - color: RED
    - name: Green
      win-condition:
        - "0,64:wool"
        - "1,64,1:gem"
      regions:
        - "hexagon:1,2,3"
        - "0,0,0:5,5,5"
  start-mechanisms:
    - "nope"
  start-region: "0,0,0"
  start-time: "25:99"
"#;
        let result = load(&WorldDocument::parse(text).unwrap());
        let locations: Vec<String> = result.warnings.iter().filter_map(|w| w.location.clone()).collect();
        assert_eq!(
            locations,
            vec![
                "match.start-time",
                "match.start-region",
                "match.teams[0]",
                "match.teams[1].regions[0]",
                "match.teams[1].win-condition[0]",
                "match.start-mechanisms[0]",
            ]
        );

        let m = result.state;
        assert_eq!(m.team_count(), 1);
        let green = m.teams().next().unwrap();
        assert_eq!(green.win_conditions().len(), 1);
        assert_eq!(green.regions().len(), 1);
        assert_eq!(m.start_time(), DEFAULT_START_TIME);
    }

    #[test]
    fn test_out_of_range_win_conditions_are_skipped() {
        let text = r#"
match:
  inexact-range: 900
  teams:
    - name: Red
      win-condition:
        - "1e20,64,0:wool:1"
        - "0,64,0:wool:5000"
        - "0,64,0:wool,14"
  start-mechanisms:
    - "-9e15,64,0:true"
"#;
        let result = load(&WorldDocument::parse(text).unwrap());
        let locations: Vec<String> = result.warnings.iter().filter_map(|w| w.location.clone()).collect();
        assert_eq!(
            locations,
            vec![
                "match.inexact-range",
                "match.teams[0].win-condition[0]",
                "match.teams[0].win-condition[1]",
                "match.start-mechanisms[0]",
            ]
        );

        let mut m = result.state;
        assert_eq!(m.inexact_range(), DEFAULT_INEXACT_RANGE);
        let red = m.teams().next().unwrap();
        assert_eq!(red.win_conditions().len(), 1);
        assert_eq!(red.win_conditions()[0].radius, DEFAULT_INEXACT_RANGE);

        // Entering play scans the surviving condition without trouble
        let mut world = crate::game::world::SimulatedWorld::new(Vec3::ZERO);
        m.start_playing(&mut world);
        assert_eq!(m.status(), MatchStatus::Playing);
    }

    #[test]
    fn test_empty_document_stays_idle() {
        let result = load(&WorldDocument::default());
        assert_eq!(result.state.status(), MatchStatus::Idle);
        assert_eq!(result.state.map_name(), UNTITLED_MAP);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let first = to_document(&load(&WorldDocument::parse(SAMPLE).unwrap()).state);
        let text = first.to_yaml().unwrap();
        let second = to_document(&load(&WorldDocument::parse(&text).unwrap()).state);
        assert_eq!(first, second);
        assert_eq!(first.layout_hash(), second.layout_hash());
    }

    #[test]
    fn test_radius_written_only_when_not_default() {
        let doc = to_document(&load(&WorldDocument::parse(SAMPLE).unwrap()).state);
        let red: TeamRecord = serde_yaml::from_value(doc.game.teams[0].clone()).unwrap();
        assert_eq!(red.win_condition, vec!["0,64,0:wool,14", "2,64,0:gold_block:3"]);
        assert_eq!(red.regions[1], "point:0,64,0/n");
        assert_eq!(doc.game.start_mechanisms, vec!["50,64,0:true"]);
        assert_eq!(doc.game.start_time.as_deref(), Some("14:00"));
    }

    #[test]
    fn test_layout_hash_tracks_changes() {
        let mut doc = WorldDocument::parse(SAMPLE).unwrap();
        let before = doc.layout_hash();
        assert_eq!(before, doc.clone().layout_hash());
        doc.game.allow_ff = Some(false);
        assert_ne!(before, doc.layout_hash());
    }

    #[test]
    fn test_start_time_formats() {
        assert_eq!(parse_start_time("06:00"), Some(0));
        assert_eq!(parse_start_time("14:00"), Some(8000));
        assert_eq!(parse_start_time("00:30"), Some(18500));
        assert_eq!(parse_start_time("13000"), Some(13000));
        assert_eq!(parse_start_time("-1000"), Some(23000));
        assert_eq!(parse_start_time("noon"), None);

        assert_eq!(format_start_time(8000), "14:00");
        assert_eq!(format_start_time(18500), "00:30");
        assert_eq!(default_start_time(), "14:00");
        for ticks in [0, 999, 8017, 23_999] {
            let once = parse_start_time(&format_start_time(ticks)).unwrap();
            assert_eq!(parse_start_time(&format_start_time(once)), Some(once));
        }
    }
}
