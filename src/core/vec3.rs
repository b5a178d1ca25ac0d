//! World Positions
//!
//! 3D world-space vectors and integer block positions.
//! Both round-trip through the `x,y,z` coordinate strings used in
//! world documents.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

/// 3D vector in world space.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component (height)
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Offset from a block corner to its center.
    pub const HALF_BLOCK: Self = Self { x: 0.5, y: 0.5, z: 0.5 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Midpoint between two vectors.
    #[inline]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(
            (self.x + other.x) * 0.5,
            (self.y + other.y) * 0.5,
            (self.z + other.z) * 0.5,
        )
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Block containing this point.
    #[inline]
    pub fn block(self) -> BlockPos {
        BlockPos::new(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }

    /// Format as an `x,y,z` coordinate string.
    pub fn to_coords(self) -> String {
        format!("{},{},{}", self.x, self.y, self.z)
    }

    /// Parse an `x,y,z` coordinate string.
    pub fn from_coords(s: &str) -> Option<Self> {
        let mut parts = s.split(',').map(|p| p.trim().parse::<f64>());
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        if parts.next().is_some() || !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return None;
        }
        Some(Self::new(x, y, z))
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// =============================================================================
// BLOCK POSITION
// =============================================================================

/// Integer block coordinates.
///
/// Implements Ord so block-keyed maps iterate deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// X block coordinate
    pub x: i32,
    /// Y block coordinate
    pub y: i32,
    /// Z block coordinate
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Corner of the block as a world-space vector.
    #[inline]
    pub fn corner(self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Center of the block as a world-space vector.
    #[inline]
    pub fn center(self) -> Vec3 {
        self.corner() + Vec3::HALF_BLOCK
    }

    /// Offset by integer deltas, saturating at the edge of the block range.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.z.saturating_add(dz),
        )
    }

    /// Format as an `x,y,z` coordinate string.
    pub fn to_coords(self) -> String {
        format!("{},{},{}", self.x, self.y, self.z)
    }

    /// Block containing a point, or `None` when the point lies outside
    /// the `i32` block range.
    pub fn containing(p: Vec3) -> Option<Self> {
        let range = i32::MIN as f64..=i32::MAX as f64;
        let (x, y, z) = (p.x.floor(), p.y.floor(), p.z.floor());
        if !(range.contains(&x) && range.contains(&y) && range.contains(&z)) {
            return None;
        }
        Some(Self::new(x as i32, y as i32, z as i32))
    }

    /// Parse an `x,y,z` coordinate string.
    ///
    /// Fractional coordinates are floored to the containing block.
    /// Coordinates outside the block range are rejected.
    pub fn from_coords(s: &str) -> Option<Self> {
        Vec3::from_coords(s).and_then(Self::containing)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_coords_round_trip() {
        let v = Vec3::new(10.0, 64.5, -3.25);
        assert_eq!(v.to_coords(), "10,64.5,-3.25");
        assert_eq!(Vec3::from_coords(&v.to_coords()), Some(v));
    }

    #[test]
    fn test_vec3_from_coords_rejects_garbage() {
        assert_eq!(Vec3::from_coords("1,2"), None);
        assert_eq!(Vec3::from_coords("1,2,3,4"), None);
        assert_eq!(Vec3::from_coords("a,b,c"), None);
        assert_eq!(Vec3::from_coords("1,NaN,3"), None);
        assert_eq!(Vec3::from_coords(" 1, 2 ,3 "), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_block_floor() {
        assert_eq!(Vec3::new(1.9, -0.1, 5.0).block(), BlockPos::new(1, -1, 5));
        assert_eq!(BlockPos::from_coords("1.5,2,-0.5"), Some(BlockPos::new(1, 2, -1)));
    }

    #[test]
    fn test_block_coords_out_of_range() {
        assert_eq!(BlockPos::from_coords("1e20,64,0"), None);
        assert_eq!(BlockPos::from_coords("0,-3000000000,0"), None);
        assert_eq!(
            BlockPos::from_coords("2147483647,0,-2147483648"),
            Some(BlockPos::new(i32::MAX, 0, i32::MIN))
        );
    }

    #[test]
    fn test_offset_saturates() {
        let edge = BlockPos::new(i32::MAX, 0, i32::MIN);
        assert_eq!(edge.offset(1, 1, -1), BlockPos::new(i32::MAX, 1, i32::MIN));
    }

    #[test]
    fn test_distance_and_midpoint() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.midpoint(b), Vec3::new(1.5, 2.0, 0.0));
        assert_eq!(BlockPos::new(1, 2, 3).center(), Vec3::new(1.5, 2.5, 3.5));
    }
}
