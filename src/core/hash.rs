//! Layout Hashing
//!
//! SHA-256 fingerprint of a persisted world document. Used to skip
//! redundant saves and to compare layouts across load/save cycles.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type LayoutHash = [u8; 32];

/// Incremental hasher over layout fields.
///
/// Strings are length-prefixed so adjacent fields cannot alias.
pub struct LayoutHasher {
    hasher: Sha256,
}

impl LayoutHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for world documents.
    pub fn for_world_document() -> Self {
        Self::new(b"ARENA_REFEREE_LAYOUT_V1")
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.hasher.update([value as u8]);
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string (presence byte first).
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_bool(true);
                self.update_str(s);
            }
            None => self.update_bool(false),
        }
    }

    /// Update with a list of strings (count first).
    pub fn update_strs<S: AsRef<str>>(&mut self, values: &[S]) {
        self.update_u32(values.len() as u32);
        for v in values {
            self.update_str(v.as_ref());
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> LayoutHash {
        self.hasher.finalize().into()
    }
}

/// Short hex prefix of a hash for log lines.
pub fn short_hex(hash: &LayoutHash) -> String {
    hex::encode(&hash[..6])
}
