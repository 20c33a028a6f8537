use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{ContentHash, Snapshot, FIELD_HASH, FIELD_TEXT, FIELD_UPDATED};

mod json;
pub use json::JsonFileStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Every watched URL mapped to its raw state entry.
///
/// Entries are kept as JSON values so that ones this process cannot
/// interpret are written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMap(pub BTreeMap<String, Value>);

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the entry for `url`.
    ///
    /// An entry without a string hash counts as no snapshot at all. A bad
    /// `text` or `updated` field is recovered as empty text or zero.
    pub fn snapshot(&self, url: &str) -> Option<Snapshot> {
        let entry = self.0.get(url)?.as_object()?;
        let hash = entry.get(FIELD_HASH)?.as_str()?;
        let text = entry
            .get(FIELD_TEXT)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let updated = entry
            .get(FIELD_UPDATED)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        Some(Snapshot {
            url: url.to_string(),
            hash: ContentHash(hash.to_string()),
            text: text.to_string(),
            updated,
        })
    }

    /// Replace the entry for the snapshot's URL.
    pub fn record(&mut self, snapshot: &Snapshot) {
        self.0.insert(
            snapshot.url.clone(),
            json!({
                FIELD_HASH: snapshot.hash.0,
                FIELD_TEXT: snapshot.text,
                FIELD_UPDATED: snapshot.updated,
            }),
        );
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Make sure the state can be written at all.
    async fn prepare(&self) -> Result<(), StorageError>;
    /// Load the whole state. Missing or unreadable state is an empty map.
    async fn load(&self) -> StateMap;
    /// Replace the whole state atomically.
    async fn save(&self, state: &StateMap) -> Result<(), StorageError>;
}
