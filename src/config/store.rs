//! Document Stores
//!
//! Where world documents live between sessions. The referee only talks to
//! the `MatchStore` trait; the file store keeps one `referee.yml` per
//! world directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ConfigError, WorldDocument};
use crate::core::ids::WorldId;

/// File name of a world's document inside its directory.
pub const DOCUMENT_FILE: &str = "referee.yml";

/// Persistence collaborator for world documents.
pub trait MatchStore {
    /// Is a document stored for the world?
    fn exists(&self, world: WorldId) -> bool;

    /// Read a world's document.
    fn load(&self, world: WorldId) -> Result<WorldDocument, ConfigError>;

    /// Write a world's document, replacing any previous one.
    fn save(&mut self, world: WorldId, doc: &WorldDocument) -> Result<(), ConfigError>;
}

// =============================================================================
// YAML FILES
// =============================================================================

/// Stores documents at `<root>/<world>/referee.yml`.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    root: PathBuf,
}

impl YamlFileStore {
    /// Store rooted at a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document path for a world.
    pub fn path_for(&self, world: WorldId) -> PathBuf {
        self.root.join(world.to_string()).join(DOCUMENT_FILE)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl MatchStore for YamlFileStore {
    fn exists(&self, world: WorldId) -> bool {
        self.path_for(world).is_file()
    }

    fn load(&self, world: WorldId) -> Result<WorldDocument, ConfigError> {
        let path = self.path_for(world);
        if !path.is_file() {
            return Err(ConfigError::NotFound(world.to_string()));
        }
        let text = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        debug!(path = %path.display(), "Loaded world document");
        WorldDocument::parse(&text)
    }

    fn save(&mut self, world: WorldId, doc: &WorldDocument) -> Result<(), ConfigError> {
        let path = self.path_for(world);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let text = doc.to_yaml()?;
        fs::write(&path, text).map_err(|e| io_error(&path, e))?;
        debug!(path = %path.display(), "Saved world document");
        Ok(())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Keeps documents in memory. Used by tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<WorldId, WorldDocument>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document.
    pub fn insert(&mut self, world: WorldId, doc: WorldDocument) {
        self.documents.insert(world, doc);
    }

    /// Stored document, if any.
    pub fn get(&self, world: WorldId) -> Option<&WorldDocument> {
        self.documents.get(&world)
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl MatchStore for MemoryStore {
    fn exists(&self, world: WorldId) -> bool {
        self.documents.contains_key(&world)
    }

    fn load(&self, world: WorldId) -> Result<WorldDocument, ConfigError> {
        self.documents
            .get(&world)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(world.to_string()))
    }

    fn save(&mut self, world: WorldId, doc: &WorldDocument) -> Result<(), ConfigError> {
        self.saves += 1;
        self.documents.insert(world, doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::MapSection;

    fn doc(name: &str) -> WorldDocument {
        WorldDocument {
            map: MapSection { name: Some(name.to_string()) },
            ..WorldDocument::default()
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlFileStore::new(dir.path());
        let world = WorldId::new([7; 16]);

        assert!(!store.exists(world));
        assert!(matches!(store.load(world), Err(ConfigError::NotFound(_))));

        store.save(world, &doc("Arena")).unwrap();
        assert!(store.exists(world));
        assert!(store.path_for(world).ends_with(DOCUMENT_FILE));
        assert_eq!(store.load(world).unwrap(), doc("Arena"));
    }

    #[test]
    fn test_file_store_reports_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlFileStore::new(dir.path());
        let world = WorldId::new([8; 16]);
        let path = store.path_for(world);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "match: [unclosed").unwrap();

        assert!(matches!(store.load(world), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        let world = WorldId::new([1; 16]);
        assert!(!store.exists(world));

        store.save(world, &doc("A")).unwrap();
        store.save(world, &doc("B")).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.get(world), Some(&doc("B")));
    }
}
