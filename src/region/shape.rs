//! Region Shapes
//!
//! Every shape answers one question: signed distance from a point
//! (negative or zero inside). Containment, "how far outside" ranking and
//! tolerance checks are all derived from it.

use std::fmt;

use crate::core::vec3::Vec3;

/// A spatial predicate usable as a region.
pub trait Shape: fmt::Debug {
    /// Registry tag this shape is constructed under.
    fn tag(&self) -> &'static str;

    /// Signed distance to a point. `<= 0.0` means inside.
    fn distance(&self, point: Vec3) -> f64;

    /// Smallest axis-aligned box covering the shape.
    fn bounding_box(&self) -> Cuboid;

    /// Body of the serialized description (without tag or flags).
    fn describe(&self) -> String;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn Shape>;
}

impl Clone for Box<dyn Shape> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// =============================================================================
// CUBOID
// =============================================================================

/// Axis-aligned box with inclusive bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cuboid {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Cuboid {
    /// Registry tag.
    pub const TAG: &'static str = "cuboid";

    /// Create from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Parse an `x1,y1,z1:x2,y2,z2` coordinate range.
    pub fn parse(body: &str) -> Option<Self> {
        let (a, b) = body.split_once(':')?;
        Some(Self::new(Vec3::from_coords(a)?, Vec3::from_coords(b)?))
    }

    /// Smallest cuboid covering both.
    pub fn combine(a: Cuboid, b: Cuboid) -> Cuboid {
        Cuboid { min: a.min.min(b.min), max: a.max.max(b.max) }
    }

    /// Inclusive bounds test.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        self.min.midpoint(self.max)
    }
}

impl Shape for Cuboid {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn distance(&self, p: Vec3) -> f64 {
        // Per-axis overshoot: positive outside the slab, negative inside
        let dx = (self.min.x - p.x).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(p.y - self.max.y);
        let dz = (self.min.z - p.z).max(p.z - self.max.z);

        if dx <= 0.0 && dy <= 0.0 && dz <= 0.0 {
            dx.max(dy).max(dz)
        } else {
            Vec3::new(dx.max(0.0), dy.max(0.0), dz.max(0.0)).length()
        }
    }

    fn bounding_box(&self) -> Cuboid {
        *self
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.min.to_coords(), self.max.to_coords())
    }

    fn clone_box(&self) -> Box<dyn Shape> {
        Box::new(*self)
    }
}

/// Registry constructor for cuboids.
pub fn parse_cuboid(body: &str) -> Option<Box<dyn Shape>> {
    Cuboid::parse(body).map(|c| Box::new(c) as Box<dyn Shape>)
}

// =============================================================================
// POINT
// =============================================================================

/// A single point. Only the point itself is inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointShape {
    /// The point
    pub point: Vec3,
}

impl PointShape {
    /// Registry tag.
    pub const TAG: &'static str = "point";

    /// Create a new point shape.
    pub fn new(point: Vec3) -> Self {
        Self { point }
    }
}

impl Shape for PointShape {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn distance(&self, p: Vec3) -> f64 {
        self.point.distance(p)
    }

    fn bounding_box(&self) -> Cuboid {
        Cuboid { min: self.point, max: self.point }
    }

    fn describe(&self) -> String {
        self.point.to_coords()
    }

    fn clone_box(&self) -> Box<dyn Shape> {
        Box::new(*self)
    }
}

/// Registry constructor for points.
pub fn parse_point(body: &str) -> Option<Box<dyn Shape>> {
    Vec3::from_coords(body).map(|p| Box::new(PointShape::new(p)) as Box<dyn Shape>)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box() -> Cuboid {
        Cuboid::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn test_cuboid_normalizes_corners() {
        let c = Cuboid::new(Vec3::new(5.0, 0.0, -1.0), Vec3::new(1.0, 3.0, -4.0));
        assert_eq!(c.min, Vec3::new(1.0, 0.0, -4.0));
        assert_eq!(c.max, Vec3::new(5.0, 3.0, -1.0));
    }

    #[test]
    fn test_cuboid_distance() {
        let c = unit_box();
        assert_eq!(c.distance(Vec3::new(5.0, 5.0, 5.0)), -5.0);
        assert_eq!(c.distance(Vec3::new(1.0, 5.0, 5.0)), -1.0);
        assert_eq!(c.distance(Vec3::new(10.0, 5.0, 5.0)), 0.0);
        assert_eq!(c.distance(Vec3::new(13.0, 14.0, 5.0)), 5.0);
    }

    #[test]
    fn test_cuboid_parse_and_describe() {
        let c = Cuboid::parse("10,0,10:0,5.5,0").unwrap();
        assert_eq!(c.describe(), "0,0,0:10,5.5,10");
        assert!(Cuboid::parse("0,0,0").is_none());
        assert!(Cuboid::parse("0,0,0:x,1,1").is_none());
    }

    #[test]
    fn test_point_distance() {
        let p = PointShape::new(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.distance(Vec3::new(1.0, 2.0, 3.0)), 0.0);
        assert_eq!(p.distance(Vec3::new(1.0, 2.0, 5.0)), 2.0);
        assert_eq!(p.bounding_box().min, p.point);
    }

    proptest! {
        #[test]
        fn prop_cuboid_contains_iff_inclusive_bounds(
            x in -20.0f64..30.0, y in -20.0f64..30.0, z in -20.0f64..30.0,
        ) {
            let c = unit_box();
            let p = Vec3::new(x, y, z);
            let in_bounds = (0.0..=10.0).contains(&x)
                && (0.0..=10.0).contains(&y)
                && (0.0..=10.0).contains(&z);
            prop_assert_eq!(c.distance(p) <= 0.0, in_bounds);
            prop_assert_eq!(c.contains(p), in_bounds);
        }

        #[test]
        fn prop_integer_boundary_points_are_inside(
            x in 0i32..=10, y in 0i32..=10, face in 0usize..3,
        ) {
            let c = unit_box();
            let mut coords = [x as f64, y as f64, 5.0];
            coords[face] = 10.0;
            let p = Vec3::new(coords[0], coords[1], coords[2]);
            prop_assert!(c.distance(p) <= 0.0);
        }
    }
}
