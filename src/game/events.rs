//! Referee Notifications
//!
//! State-change facts pushed out of a match. Delivery is up to the sink:
//! tracing output, an in-memory log for tests, or JSON lines for a
//! downstream consumer.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::game::objective::GoalStatus;
use crate::game::status::MatchStatus;

/// Notification payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    /// Team created
    TeamInit {
        /// Internal team name
        team: String,
    },

    /// Team color set
    TeamColor {
        /// Internal team name
        team: String,
        /// Color config name
        color: String,
    },

    /// Team display name changed
    TeamRenamed {
        /// Internal team name
        team: String,
        /// New display name
        name: String,
    },

    /// Member joined or left
    TeamRoster {
        /// Internal team name
        team: String,
        /// Player name
        player: String,
        /// Joined (true) or left (false)
        joined: bool,
    },

    /// Readiness flag changed
    TeamReady {
        /// Internal team name
        team: String,
        /// New flag
        ready: bool,
    },

    /// New objective signature introduced by a win-condition
    ObjectiveAdded {
        /// Internal team name
        team: String,
        /// Block signature
        signature: String,
    },

    /// Goal-state transition
    ObjectiveState {
        /// Internal team name
        team: String,
        /// Block signature
        signature: String,
        /// New goal state
        status: GoalStatus,
    },

    /// Player entered the match world
    PlayerLogin {
        /// Player name
        player: String,
    },

    /// Player picked up or lost an objective item
    PlayerCarrying {
        /// Player name
        player: String,
        /// Item signature
        signature: String,
        /// Picked up (true) or lost (false)
        gained: bool,
    },

    /// Health or armor changed
    PlayerHealth {
        /// Player name
        player: String,
        /// Health points
        health: u32,
        /// Armor points
        armor: u32,
    },

    /// Lifecycle transition
    StatusChanged {
        /// Previous status
        from: MatchStatus,
        /// New status
        to: MatchStatus,
    },

    /// Countdown armed
    CountdownStarted {
        /// Countdown length
        seconds: u32,
    },

    /// Countdown cancelled
    CountdownCancelled,

    /// Player pushed back out of a forbidden zone
    ZoneViolation {
        /// Player name
        player: String,
        /// Rejected position
        position: String,
    },

    /// Start trigger registered
    StartTriggerAdded {
        /// Trigger block coordinates
        location: String,
        /// Powered state that counts as actuated
        state: bool,
    },

    /// Result recorded
    MatchEnded {
        /// Winning team display name
        winner: Option<String>,
    },
}

impl fmt::Display for NotificationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NotificationData::*;

        match self {
            TeamInit { team } => write!(f, "team {} init", team),
            TeamColor { team, color } => write!(f, "team {} color {}", team, color),
            TeamRenamed { team, name } => write!(f, "team {} name {}", team, name),
            TeamRoster { team, player, joined } => {
                write!(f, "team {} player {}{}", team, if *joined { '+' } else { '-' }, player)
            }
            TeamReady { team, ready } => {
                write!(f, "team {} {}", team, if *ready { "ready" } else { "notready" })
            }
            ObjectiveAdded { team, signature } => write!(f, "team {} obj +{}", team, signature),
            ObjectiveState { team, signature, status } => {
                write!(f, "team {} state {} {}", team, signature, status)
            }
            PlayerLogin { player } => write!(f, "player {} login", player),
            PlayerCarrying { player, signature, gained } => {
                write!(f, "player {} obj {}{}", player, if *gained { '+' } else { '-' }, signature)
            }
            PlayerHealth { player, health, armor } => {
                write!(f, "player {} hp {} {}", player, health, armor)
            }
            StatusChanged { to, .. } => write!(f, "match status {}", to),
            CountdownStarted { seconds } => write!(f, "match countdown {}", seconds),
            CountdownCancelled => f.write_str("match countdown cancel"),
            ZoneViolation { player, position } => write!(f, "player {} zone {}", player, position),
            StartTriggerAdded { location, state } => write!(f, "match mech {}:{}", location, state),
            MatchEnded { winner } => {
                write!(f, "match end {}", winner.as_deref().unwrap_or("none"))
            }
        }
    }
}

/// A notification stamped with the match tick it was produced on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Match tick
    pub tick: u64,

    /// Payload
    pub data: NotificationData,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Receiver of referee notifications.
pub trait NotificationSink {
    /// Deliver one notification. Must not fail.
    fn notify(&mut self, notification: &Notification);
}

/// Logs notifications as `info!` lines under the `referee` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, notification: &Notification) {
        info!(target: "referee", tick = notification.tick, "{}", notification.data);
    }
}

/// Shared in-memory log. Clones see the same log.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl MemorySink {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received.
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    /// Rendered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().iter().map(|n| n.to_string()).collect()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

impl NotificationSink for MemorySink {
    fn notify(&mut self, notification: &Notification) {
        self.log.borrow_mut().push(notification.clone());
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NotificationSink for JsonLinesSink<W> {
    fn notify(&mut self, notification: &Notification) {
        let result = serde_json::to_writer(&mut self.writer, notification)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            warn!("Dropped notification: {}", e);
        }
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Stamps payloads with the current tick and forwards them to the sink.
pub struct Notifier {
    tick: u64,
    sink: Box<dyn NotificationSink>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").field("tick", &self.tick).finish()
    }
}

impl Notifier {
    /// Wrap a sink.
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        Self { tick: 0, sink }
    }

    /// Set the tick stamped on subsequent notifications.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Push a notification.
    pub fn emit(&mut self, data: NotificationData) {
        self.sink.notify(&Notification { tick: self.tick, data });
    }
}
