//! Content Hash Value Object
//!
//! A SHA-256 digest with the `sha256:` prefix. Used to confirm that an
//! uploaded artifact matches its local source.

use std::fmt;

/// Content hash value object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Prefix for SHA-256 hashes
    pub const PREFIX: &'static str = "sha256:";

    /// Wrap a hex digest as printed by `sha256sum` (prefix optional)
    pub fn new(raw_hash: &str) -> Self {
        let raw_hash = raw_hash.trim();
        if raw_hash.starts_with(Self::PREFIX) {
            Self(raw_hash.to_ascii_lowercase())
        } else {
            Self(format!("{}{}", Self::PREFIX, raw_hash.to_ascii_lowercase()))
        }
    }

    /// Compute the SHA-256 of raw bytes
    pub fn from_bytes(content: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(content);
        Self(format!("{}{:x}", Self::PREFIX, hash))
    }

    /// Parse the first field of `sha256sum`/`shasum -a 256` output
    pub fn from_sum_output(output: &str) -> Option<Self> {
        let hex = output.split_whitespace().next()?;
        if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self::new(hex))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Just the hex part without prefix
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
