//! Objective Tracking
//!
//! Per-team goal states, derived from live observations each evaluation:
//!
//! 1. any win-condition for the signature has a matching block within its
//!    radius → PLACED
//! 2. else any present member carries it → CARRYING
//! 3. else if it was ever found → SEEN
//!
//! Rule 3 is the only downgrade. Nothing ever lowers a status to NONE.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec3::{BlockPos, Vec3};
use crate::region::{PointShape, Shape};
use crate::MAX_INEXACT_RANGE;

// =============================================================================
// BLOCK SIGNATURE
// =============================================================================

/// Typed block identity: material plus optional data value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockSignature {
    /// Lowercase material name
    pub material: String,
    /// Data value; `None` matches any
    pub data: Option<u8>,
}

impl BlockSignature {
    /// Material name of the no-op signature.
    pub const AIR: &'static str = "air";

    /// Create a signature.
    pub fn new(material: &str, data: Option<u8>) -> Self {
        Self {
            material: material.trim().to_ascii_lowercase(),
            data,
        }
    }

    /// Signature matching any data value of a material.
    pub fn material(material: &str) -> Self {
        Self::new(material, None)
    }

    /// Is this the empty block?
    pub fn is_air(&self) -> bool {
        self.material == Self::AIR
    }

    /// Does a concrete block satisfy this signature?
    pub fn matches(&self, block: &BlockSignature) -> bool {
        self.material == block.material && (self.data.is_none() || self.data == block.data)
    }

    /// Parse `material` or `material,data`.
    pub fn parse(s: &str) -> Option<Self> {
        let (material, data) = match s.split_once(',') {
            Some((m, d)) => (m, Some(d.trim().parse::<u8>().ok()?)),
            None => (s, None),
        };
        let material = material.trim();
        if material.is_empty() || !material.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(Self::new(material, data))
    }
}

impl fmt::Display for BlockSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            Some(d) => write!(f, "{},{}", self.material, d),
            None => f.write_str(&self.material),
        }
    }
}

// =============================================================================
// GOAL STATUS
// =============================================================================

/// Discrete progress of one objective for one team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Never observed
    #[default]
    None,
    /// Observed at least once
    Seen,
    /// A team member holds it
    Carrying,
    /// Delivered at a win-condition location
    Placed,
}

impl GoalStatus {
    /// Text used in referee notifications.
    pub fn text(self) -> &'static str {
        match self {
            GoalStatus::None => "none",
            GoalStatus::Seen => "found",
            GoalStatus::Carrying => "carry",
            GoalStatus::Placed => "vm",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// =============================================================================
// WIN CONDITION
// =============================================================================

/// What must be delivered where, with a tolerance radius in blocks.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WinCondition {
    /// Target block
    pub location: BlockPos,
    /// Block that must end up there
    pub signature: BlockSignature,
    /// Tolerance radius (0 = exact block)
    pub radius: u32,
}

impl WinCondition {
    /// Create a win-condition.
    pub fn new(location: BlockPos, signature: BlockSignature, radius: u32) -> Self {
        Self { location, signature, radius }
    }

    /// Parse `<x,y,z>:<signature>[:<radius>]`. Radii above
    /// `MAX_INEXACT_RANGE` are rejected.
    pub fn parse(entry: &str, default_radius: u32) -> Option<Self> {
        let mut parts = entry.split(':');
        let location = BlockPos::from_coords(parts.next()?)?;
        let signature = BlockSignature::parse(parts.next()?)?;
        let radius = match parts.next() {
            Some(r) => r.trim().parse().ok()?,
            None => default_radius,
        };
        if radius > MAX_INEXACT_RANGE {
            return None;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(location, signature, radius))
    }

    /// Format for a world document. The radius is omitted when it equals
    /// the match default.
    pub fn to_entry(&self, default_radius: u32) -> String {
        let mut out = format!("{}:{}", self.location.to_coords(), self.signature);
        if self.radius != default_radius {
            out.push_str(&format!(":{}", self.radius));
        }
        out
    }
}

/// Find a block matching the condition's signature within its radius.
///
/// Candidates are blocks in the enclosing cube whose centers lie within
/// `radius` of the target block's center. The radius is capped at
/// `MAX_INEXACT_RANGE`.
pub fn find_placed<F>(condition: &WinCondition, mut block_at: F) -> Option<BlockPos>
where
    F: FnMut(BlockPos) -> Option<BlockSignature>,
{
    let radius = condition.radius.min(MAX_INEXACT_RANGE);
    let target = PointShape::new(condition.location.center());
    let r = radius as i32;
    let limit = radius as f64;

    for dx in -r..=r {
        for dy in -r..=r {
            for dz in -r..=r {
                let pos = condition.location.offset(dx, dy, dz);
                if target.distance(pos.center()) > limit {
                    continue;
                }
                if block_at(pos).is_some_and(|b| condition.signature.matches(&b)) {
                    return Some(pos);
                }
            }
        }
    }
    None
}

// =============================================================================
// TRACKER
// =============================================================================

/// Tracked state of one objective.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveEntry {
    /// Current goal status
    pub status: GoalStatus,
    /// Where the status last changed
    pub last_location: Option<Vec3>,
}

/// A status transition produced by the tracker.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveChange {
    /// Objective that changed
    pub signature: BlockSignature,
    /// Previous status
    pub from: GoalStatus,
    /// New status
    pub to: GoalStatus,
    /// Location associated with the change
    pub location: Option<Vec3>,
}

/// Goal status per objective signature.
#[derive(Clone, Debug, Default)]
pub struct ObjectiveTracker {
    entries: BTreeMap<BlockSignature, ObjectiveEntry>,
}

impl ObjectiveTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state and track these objectives at NONE.
    pub fn reset<I>(&mut self, objectives: I)
    where
        I: IntoIterator<Item = BlockSignature>,
    {
        self.entries.clear();
        for sig in objectives {
            self.track(sig);
        }
    }

    /// Start tracking an objective at NONE. No-op if already tracked.
    pub fn track(&mut self, signature: BlockSignature) {
        self.entries.entry(signature).or_insert(ObjectiveEntry {
            status: GoalStatus::None,
            last_location: None,
        });
    }

    /// Is this objective tracked?
    pub fn is_tracking(&self, signature: &BlockSignature) -> bool {
        self.entries.contains_key(signature)
    }

    /// Tracked signatures.
    pub fn signatures(&self) -> impl Iterator<Item = &BlockSignature> {
        self.entries.keys()
    }

    /// Status of an objective (NONE when untracked).
    pub fn status(&self, signature: &BlockSignature) -> GoalStatus {
        self.entries.get(signature).map_or(GoalStatus::None, |e| e.status)
    }

    /// Entry for an objective.
    pub fn entry(&self, signature: &BlockSignature) -> Option<&ObjectiveEntry> {
        self.entries.get(signature)
    }

    /// Snapshot of all statuses.
    pub fn statuses(&self) -> BTreeMap<BlockSignature, GoalStatus> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.status)).collect()
    }

    /// Objectives at PLACED.
    pub fn placed_count(&self) -> usize {
        self.entries.values().filter(|e| e.status == GoalStatus::Placed).count()
    }

    /// Objectives not at NONE.
    pub fn found_count(&self) -> usize {
        self.entries.values().filter(|e| e.status != GoalStatus::None).count()
    }

    /// Set a tracked objective's status. Returns the change, if any.
    pub fn set_status(
        &mut self,
        signature: &BlockSignature,
        status: GoalStatus,
        location: Option<Vec3>,
    ) -> Option<ObjectiveChange> {
        let entry = self.entries.get_mut(signature)?;
        if entry.status == status {
            return None;
        }

        let from = entry.status;
        entry.status = status;
        if location.is_some() {
            entry.last_location = location;
        }

        Some(ObjectiveChange {
            signature: signature.clone(),
            from,
            to: status,
            location: entry.last_location,
        })
    }

    /// Record a sighting: NONE → SEEN only.
    pub fn mark_seen(&mut self, signature: &BlockSignature, location: Vec3) -> Option<ObjectiveChange> {
        if self.status(signature) != GoalStatus::None {
            return None;
        }
        self.set_status(signature, GoalStatus::Seen, Some(location))
    }

    /// Re-derive every tracked objective.
    ///
    /// `placed` locates a delivered block for one condition; `carried`
    /// locates a present member carrying a signature.
    pub fn evaluate<P, C>(
        &mut self,
        conditions: &[WinCondition],
        mut placed: P,
        mut carried: C,
    ) -> Vec<ObjectiveChange>
    where
        P: FnMut(&WinCondition) -> Option<BlockPos>,
        C: FnMut(&BlockSignature) -> Option<Vec3>,
    {
        let mut changes = Vec::new();
        let signatures: Vec<BlockSignature> = self.entries.keys().cloned().collect();

        for sig in signatures {
            let delivered = conditions
                .iter()
                .filter(|wc| wc.signature == sig)
                .find_map(&mut placed);

            let next = if let Some(pos) = delivered {
                Some((GoalStatus::Placed, Some(pos.center())))
            } else if let Some(at) = carried(&sig) {
                Some((GoalStatus::Carrying, Some(at)))
            } else if self.status(&sig) != GoalStatus::None {
                Some((GoalStatus::Seen, None))
            } else {
                None
            };

            if let Some((status, location)) = next {
                if let Some(change) = self.set_status(&sig, status, location) {
                    changes.push(change);
                }
            }
        }

        changes
    }
}

// =============================================================================
// TESTS
// =============================================================================
