use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// NewType pattern for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// SHA-256 of the UTF-8 bytes of `text`, as lowercase hex.
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        ContentHash(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last observed state of one watched URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    pub hash: ContentHash,
    pub text: String,
    /// Epoch seconds of the fetch that produced `text`.
    pub updated: i64,
}

impl Snapshot {
    /// Builds a snapshot whose hash is derived from `text`, so the two can
    /// never disagree.
    pub fn capture(url: impl Into<String>, text: String, updated: i64) -> Self {
        Self {
            url: url.into(),
            hash: ContentHash::of(&text),
            text,
            updated,
        }
    }

    pub fn matches(&self, hash: &ContentHash) -> bool {
        &self.hash == hash
    }
}
