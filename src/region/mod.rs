//! Region Model
//!
//! A region is a shape plus behavioral flags and a set of owning teams.
//! Owners are held by id only; teams own regions, never the reverse.
//!
//! ## Module Structure
//!
//! - `shape`: `Shape` trait, `Cuboid` and `PointShape`
//! - `registry`: tag → constructor lookup for serialized regions

pub mod shape;
pub mod registry;

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::ids::TeamId;
use crate::core::vec3::Vec3;

pub use shape::{Shape, Cuboid, PointShape};
pub use registry::{RegionRegistry, RegistryBuilder, RegionParseError};

// =============================================================================
// FLAGS
// =============================================================================

/// Behavioral flag on a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RegionFlag {
    /// No placing or breaking blocks
    NoBuild = 1 << 0,
    /// Negative region, carves access out of surrounding zones
    NoEntry = 1 << 1,
    /// No hostile spawns, no tracking
    Safe = 1 << 2,
}

impl RegionFlag {
    /// All flags in bit order.
    pub const ALL: [RegionFlag; 3] = [RegionFlag::NoBuild, RegionFlag::NoEntry, RegionFlag::Safe];

    /// Bit value.
    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Name used in commands.
    pub fn name(self) -> &'static str {
        match self {
            RegionFlag::NoBuild => "nobuild",
            RegionFlag::NoEntry => "noentry",
            RegionFlag::Safe => "safe",
        }
    }

    /// Marker character used in world documents.
    pub fn mark(self) -> char {
        match self {
            RegionFlag::NoBuild => 'b',
            RegionFlag::NoEntry => 'n',
            RegionFlag::Safe => 's',
        }
    }

    /// Look up a flag by its marker character.
    pub fn from_mark(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mark() == c)
    }
}

/// Bit set over `RegionFlag`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegionFlags(u8);

impl RegionFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);

    /// Is this flag set?
    #[inline]
    pub fn contains(self, flag: RegionFlag) -> bool {
        self.0 & flag.value() != 0
    }

    /// Set a flag.
    #[inline]
    pub fn insert(&mut self, flag: RegionFlag) {
        self.0 |= flag.value();
    }

    /// Flip a flag.
    #[inline]
    pub fn toggle(&mut self, flag: RegionFlag) {
        self.0 ^= flag.value();
    }

    /// Is no flag set?
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set flags, in bit order.
    pub fn iter(self) -> impl Iterator<Item = RegionFlag> {
        RegionFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Marker string, e.g. `"bn"`.
    pub fn marks(self) -> String {
        self.iter().map(RegionFlag::mark).collect()
    }

    /// Parse a marker string. Fails on the first unknown marker.
    pub fn from_marks(marks: &str) -> Result<Self, char> {
        let mut flags = Self::EMPTY;
        for c in marks.chars() {
            flags.insert(RegionFlag::from_mark(c).ok_or(c)?);
        }
        Ok(flags)
    }
}

// =============================================================================
// REGION
// =============================================================================

/// A shape with flags and owners.
#[derive(Clone, Debug)]
pub struct Region {
    shape: Box<dyn Shape>,
    flags: RegionFlags,
    owners: BTreeSet<TeamId>,
}

impl Region {
    /// Wrap a shape with no flags and no owners.
    pub fn new(shape: Box<dyn Shape>) -> Self {
        Self {
            shape,
            flags: RegionFlags::EMPTY,
            owners: BTreeSet::new(),
        }
    }

    /// Convenience constructor for a cuboid region.
    pub fn cuboid(a: Vec3, b: Vec3) -> Self {
        Self::new(Box::new(Cuboid::new(a, b)))
    }

    /// Convenience constructor for a point region.
    pub fn point(p: Vec3) -> Self {
        Self::new(Box::new(PointShape::new(p)))
    }

    /// Builder-style flag setter.
    pub fn with_flags(mut self, flags: RegionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Underlying shape.
    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    /// Signed distance to a point (`<= 0` inside).
    #[inline]
    pub fn distance(&self, p: Vec3) -> f64 {
        self.shape.distance(p)
    }

    /// Is the point inside?
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        self.distance(p) <= 0.0
    }

    /// Bounding box of the shape.
    pub fn bounding_box(&self) -> Cuboid {
        self.shape.bounding_box()
    }

    /// Building is allowed unless NO_BUILD is set.
    #[inline]
    pub fn can_build(&self) -> bool {
        !self.flags.contains(RegionFlag::NoBuild)
    }

    /// Entry is allowed unless NO_ENTRY is set.
    #[inline]
    pub fn can_enter(&self) -> bool {
        !self.flags.contains(RegionFlag::NoEntry)
    }

    /// SAFE flag.
    #[inline]
    pub fn is_safe_zone(&self) -> bool {
        self.flags.contains(RegionFlag::Safe)
    }

    /// Flag set snapshot.
    pub fn flags(&self) -> RegionFlags {
        self.flags
    }

    /// Flip a flag.
    pub fn toggle(&mut self, flag: RegionFlag) -> &mut Self {
        self.flags.toggle(flag);
        self
    }

    /// Set every flag named in a marker string. Nothing changes if a
    /// marker is unknown.
    pub fn add_flags(&mut self, marks: &str) -> Result<&mut Self, char> {
        let added = RegionFlags::from_marks(marks)?;
        for flag in added.iter() {
            self.flags.insert(flag);
        }
        Ok(self)
    }

    /// Owning teams.
    pub fn owners(&self) -> &BTreeSet<TeamId> {
        &self.owners
    }

    /// Add an owning team.
    pub fn add_owner(&mut self, team: TeamId) {
        self.owners.insert(team);
    }

    /// Is this team an owner?
    pub fn is_owner(&self, team: TeamId) -> bool {
        self.owners.contains(&team)
    }

    /// Serialized description: `[<tag>:]<body>[/<marks>]`.
    ///
    /// Cuboids omit their tag, matching the bare coordinate-range form.
    pub fn describe(&self) -> String {
        let mut out = if self.shape.tag() == Cuboid::TAG {
            self.shape.describe()
        } else {
            format!("{}:{}", self.shape.tag(), self.shape.describe())
        };
        if !self.flags.is_empty() {
            out.push('/');
            out.push_str(&self.flags.marks());
        }
        out
    }

    /// Bounding cuboid covering both regions; either may be absent.
    pub fn combine(a: Option<&Region>, b: Option<&Region>) -> Option<Cuboid> {
        match (a, b) {
            (None, None) => None,
            (Some(r), None) | (None, Some(r)) => Some(r.bounding_box()),
            (Some(a), Some(b)) => Some(Cuboid::combine(a.bounding_box(), b.bounding_box())),
        }
    }
}

// =============================================================================
// ZONE QUERIES
// =============================================================================
//
// Team-level queries over the match-wide start region plus a team's own
// region set.

/// Distance from a point to the closest of the start region and `regions`.
///
/// Stops folding in regions once the running minimum reaches zero.
pub fn distance_to_closest(start: Option<&Region>, regions: &[Region], p: Vec3) -> f64 {
    let mut distance = start.map_or(f64::INFINITY, |r| r.distance(p));
    for region in regions {
        if distance <= 0.0 {
            break;
        }
        distance = distance.min(region.distance(p));
    }
    distance
}

/// May a point be entered, given a tolerance?
///
/// Any NO_ENTRY region within `tolerance` rejects, whatever the running
/// minimum says.
pub fn can_enter(start: Option<&Region>, regions: &[Region], p: Vec3, tolerance: f64) -> bool {
    let mut distance = start.map_or(f64::INFINITY, |r| r.distance(p));
    for region in regions {
        let d = region.distance(p);
        if !region.can_enter() && d <= tolerance {
            return false;
        }
        if distance > 0.0 {
            distance = distance.min(d);
        }
    }
    distance <= tolerance
}

/// May a block be placed or broken at this point?
///
/// The start region is a permanent no-build zone. Otherwise the point must
/// be inside at least one region, and any containing NO_BUILD region vetoes.
pub fn can_build(start: Option<&Region>, regions: &[Region], p: Vec3) -> bool {
    if start.is_some_and(|r| r.contains(p)) {
        return false;
    }

    let mut build = false;
    for region in regions {
        if !region.bounding_box().contains(p) || !region.contains(p) {
            continue;
        }
        if !region.can_build() {
            return false;
        }
        build = true;
    }
    build
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cube(min: f64, max: f64) -> Region {
        Region::cuboid(Vec3::new(min, min, min), Vec3::new(max, max, max))
    }

    #[test]
    fn test_flag_marks_round_trip() {
        let flags = RegionFlags::from_marks("sb").unwrap();
        assert!(flags.contains(RegionFlag::NoBuild));
        assert!(flags.contains(RegionFlag::Safe));
        assert!(!flags.contains(RegionFlag::NoEntry));
        assert_eq!(flags.marks(), "bs");
        assert_eq!(RegionFlags::from_marks("bx"), Err('x'));
    }

    #[test]
    fn test_add_flags() {
        let mut r = cube(0.0, 1.0);
        r.add_flags("n").unwrap();
        assert!(!r.can_enter());
        assert!(r.add_flags("bq").is_err());
        assert!(r.can_build());
        r.add_flags("nb").unwrap();
        assert_eq!(r.flags().marks(), "bn");
    }

    #[test]
    fn test_region_flag_predicates() {
        let mut r = cube(0.0, 1.0);
        assert!(r.can_build() && r.can_enter() && !r.is_safe_zone());

        r.toggle(RegionFlag::NoBuild).toggle(RegionFlag::Safe);
        assert!(!r.can_build());
        assert!(r.is_safe_zone());

        r.toggle(RegionFlag::NoBuild);
        assert!(r.can_build());
    }

    #[test]
    fn test_describe() {
        let r = cube(0.0, 2.0).with_flags(RegionFlags::from_marks("n").unwrap());
        assert_eq!(r.describe(), "0,0,0:2,2,2/n");
        assert_eq!(Region::point(Vec3::new(1.0, 2.0, 3.0)).describe(), "point:1,2,3");
    }

    #[test]
    fn test_combine() {
        let a = cube(0.0, 1.0);
        let b = cube(5.0, 6.0);
        assert!(Region::combine(None, None).is_none());
        assert_eq!(Region::combine(Some(&a), None), Some(a.bounding_box()));
        let c = Region::combine(Some(&a), Some(&b)).unwrap();
        assert_eq!(c.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(c.max, Vec3::new(6.0, 6.0, 6.0));
    }

    #[test]
    fn test_distance_to_closest_uses_start_region() {
        let start = cube(0.0, 1.0);
        let p = Vec3::new(3.0, 0.5, 0.5);
        assert_eq!(distance_to_closest(Some(&start), &[], p), 2.0);
        assert_eq!(distance_to_closest(None, &[], p), f64::INFINITY);
        let around = Region::cuboid(Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 1.0));
        assert_eq!(distance_to_closest(Some(&start), &[around], p), -0.5);
    }

    #[test]
    fn test_no_entry_on_boundary_rejects_at_zero_tolerance() {
        let mut blocked = cube(0.0, 4.0);
        blocked.toggle(RegionFlag::NoEntry);
        let open = cube(-10.0, 10.0);
        let p = Vec3::new(4.0, 2.0, 2.0);

        // Running minimum alone would call this enterable
        assert!(distance_to_closest(None, &[open.clone()], p) <= 0.0);
        assert!(!can_enter(None, &[open.clone(), blocked.clone()], p, 0.0));
        assert!(!can_enter(None, &[blocked, open], p, 0.0));
    }

    #[test]
    fn test_can_enter_tolerance() {
        let r = cube(0.0, 1.0);
        let p = Vec3::new(1.2, 0.5, 0.5);
        assert!(!can_enter(None, &[r.clone()], p, 0.1));
        assert!(can_enter(None, &[r], p, 0.301));
    }

    #[test]
    fn test_can_build() {
        let start = cube(-2.0, -1.0);
        let mut guarded = cube(4.0, 6.0);
        guarded.toggle(RegionFlag::NoBuild);
        let regions = vec![cube(0.0, 10.0), guarded];

        assert!(can_build(Some(&start), &regions, Vec3::new(1.0, 1.0, 1.0)));
        assert!(!can_build(Some(&start), &regions, Vec3::new(5.0, 5.0, 5.0)));
        assert!(!can_build(Some(&start), &regions, Vec3::new(20.0, 1.0, 1.0)));
        assert!(!can_build(Some(&start), &[cube(-5.0, 5.0)], Vec3::new(-1.5, -1.5, -1.5)));
    }

    proptest! {
        #[test]
        fn prop_closest_distance_non_increasing(
            boxes in proptest::collection::vec((-50.0f64..50.0, 0.5f64..10.0), 1..8),
            px in -60.0f64..60.0, py in -60.0f64..60.0, pz in -60.0f64..60.0,
        ) {
            let p = Vec3::new(px, py, pz);
            let start = cube(100.0, 101.0);
            let mut regions = Vec::new();
            let mut last = distance_to_closest(Some(&start), &regions, p);
            for (lo, size) in boxes {
                regions.push(cube(lo, lo + size));
                let next = distance_to_closest(Some(&start), &regions, p);
                prop_assert!(next <= last);
                last = next;
            }
        }
    }
}
