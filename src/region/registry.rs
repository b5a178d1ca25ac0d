//! Region Registry
//!
//! Maps a tag to a shape constructor. Populated once through
//! `RegistryBuilder` before any world document is parsed; the built
//! `RegionRegistry` has no way to add tags.

use std::collections::BTreeMap;

use super::shape::{parse_cuboid, parse_point, Cuboid, PointShape, Shape};
use super::{Region, RegionFlags};

/// Constructor from a description body.
pub type ShapeParser = fn(&str) -> Option<Box<dyn Shape>>;

/// Tag used when a description has no tag prefix.
pub const DEFAULT_TAG: &str = Cuboid::TAG;

/// Region description errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionParseError {
    /// No constructor registered under this tag.
    #[error("Unknown region tag: {0}")]
    UnknownTag(String),

    /// Constructor rejected the body.
    #[error("Malformed {tag} region: {body}")]
    Malformed {
        /// Tag that was dispatched on.
        tag: String,
        /// Offending body.
        body: String,
    },

    /// Flag marker not recognized.
    #[error("Unknown region flag: {0}")]
    UnknownFlag(char),

    /// Tag registered twice.
    #[error("Region tag already registered: {0}")]
    DuplicateTag(String),
}

/// Collects shape constructors before the registry is frozen.
pub struct RegistryBuilder {
    parsers: BTreeMap<String, ShapeParser>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Builder with the built-in `cuboid` and `point` shapes.
    pub fn new() -> Self {
        let mut parsers: BTreeMap<String, ShapeParser> = BTreeMap::new();
        parsers.insert(Cuboid::TAG.to_string(), parse_cuboid);
        parsers.insert(PointShape::TAG.to_string(), parse_point);
        Self { parsers }
    }

    /// Register an extension shape.
    pub fn register(mut self, tag: &str, parser: ShapeParser) -> Result<Self, RegionParseError> {
        if !is_tag(tag) {
            return Err(RegionParseError::UnknownTag(tag.to_string()));
        }
        if self.parsers.contains_key(tag) {
            return Err(RegionParseError::DuplicateTag(tag.to_string()));
        }
        self.parsers.insert(tag.to_string(), parser);
        Ok(self)
    }

    /// Freeze into an immutable registry.
    pub fn build(self) -> RegionRegistry {
        RegionRegistry { parsers: self.parsers }
    }
}

/// Immutable tag → constructor lookup.
#[derive(Clone)]
pub struct RegionRegistry {
    parsers: BTreeMap<String, ShapeParser>,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

impl std::fmt::Debug for RegionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRegistry")
            .field("tags", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RegionRegistry {
    /// Registered tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Find the constructor for a tag.
    pub fn lookup(&self, tag: &str) -> Result<ShapeParser, RegionParseError> {
        self.parsers
            .get(tag)
            .copied()
            .ok_or_else(|| RegionParseError::UnknownTag(tag.to_string()))
    }

    /// Parse a `[<tag>:]<body>[/<marks>]` description.
    pub fn parse(&self, description: &str) -> Result<Region, RegionParseError> {
        let description = description.trim();
        let (main, marks) = match description.rsplit_once('/') {
            Some((main, marks)) => (main, Some(marks)),
            None => (description, None),
        };

        let (tag, body) = match main.split_once(':') {
            Some((prefix, rest)) if is_tag(prefix) => (prefix, rest),
            _ => (DEFAULT_TAG, main),
        };

        let parser = self.lookup(tag)?;
        let shape = parser(body.trim()).ok_or_else(|| RegionParseError::Malformed {
            tag: tag.to_string(),
            body: body.to_string(),
        })?;

        let flags = match marks {
            Some(m) => RegionFlags::from_marks(m.trim()).map_err(RegionParseError::UnknownFlag)?,
            None => RegionFlags::EMPTY,
        };

        Ok(Region::new(shape).with_flags(flags))
    }
}

fn is_tag(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::Vec3;
    use crate::region::RegionFlag;

    #[derive(Debug, Clone, Copy)]
    struct Sphere {
        center: Vec3,
        radius: f64,
    }

    impl Shape for Sphere {
        fn tag(&self) -> &'static str {
            "sphere"
        }

        fn distance(&self, p: Vec3) -> f64 {
            self.center.distance(p) - self.radius
        }

        fn bounding_box(&self) -> Cuboid {
            let r = Vec3::new(self.radius, self.radius, self.radius);
            Cuboid::new(self.center - r, self.center + r)
        }

        fn describe(&self) -> String {
            format!("{}:{}", self.center.to_coords(), self.radius)
        }

        fn clone_box(&self) -> Box<dyn Shape> {
            Box::new(*self)
        }
    }

    fn parse_sphere(body: &str) -> Option<Box<dyn Shape>> {
        let (c, r) = body.split_once(':')?;
        Some(Box::new(Sphere { center: Vec3::from_coords(c)?, radius: r.parse().ok()? }))
    }

    #[test]
    fn test_builtin_tags() {
        let registry = RegionRegistry::default();
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["cuboid", "point"]);
    }

    #[test]
    fn test_parse_bare_coordinate_range() {
        let registry = RegionRegistry::default();
        let region = registry.parse("0,0,0:4,4,4").unwrap();
        assert_eq!(region.shape().tag(), "cuboid");
        assert!(region.contains(Vec3::new(4.0, 4.0, 4.0)));
    }

    #[test]
    fn test_parse_tagged_with_flags() {
        let registry = RegionRegistry::default();
        let region = registry.parse("point:1,2,3/bs").unwrap();
        assert_eq!(region.shape().tag(), "point");
        assert!(!region.can_build());
        assert!(region.is_safe_zone());
        assert_eq!(region.describe(), "point:1,2,3/bs");
    }

    #[test]
    fn test_parse_errors() {
        let registry = RegionRegistry::default();
        assert_eq!(
            registry.parse("hexagon:1,2,3").unwrap_err(),
            RegionParseError::UnknownTag("hexagon".into())
        );
        assert!(matches!(registry.parse("0,0,0"), Err(RegionParseError::Malformed { .. })));
        assert_eq!(registry.parse("0,0,0:1,1,1/q").unwrap_err(), RegionParseError::UnknownFlag('q'));
    }

    #[test]
    fn test_registered_extension() {
        let registry = RegistryBuilder::new()
            .register("sphere", parse_sphere)
            .unwrap()
            .build();

        let mut region = registry.parse("sphere:0,0,0:2").unwrap();
        assert!(region.contains(Vec3::new(1.0, 1.0, 0.0)));
        assert!(!region.contains(Vec3::new(2.0, 2.0, 0.0)));

        region.toggle(RegionFlag::NoEntry);
        let again = registry.parse(&region.describe()).unwrap();
        assert!(!again.can_enter());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = RegistryBuilder::new().register("point", parse_point);
        assert!(matches!(result, Err(RegionParseError::DuplicateTag(_))));
    }
}
