//! Fingerprints of configuration images.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An XXH3-128 digest identifying the exact contents of an image.
///
/// Building the same entities in the same order must yield the same
/// fingerprint; comparing fingerprints is cheaper than comparing images.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Digests raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Digests packed 32-bit words, each taken as four little-endian bytes
    /// so the result is the same on every host.
    pub fn from_words(words: &[u32]) -> Self {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self::from_bytes(&bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    /// Lowercase hex, 32 characters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "ContentHash({}..)", &hex[..8])
    }
}
