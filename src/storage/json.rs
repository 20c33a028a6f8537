use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::storage::{SnapshotStore, StateMap, StorageError};

/// State kept as a single pretty-printed JSON document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next state is staged in before it replaces `path`.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_parent(&self) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir)
                    .await
                    .map_err(|source| StorageError::CreateDir {
                        path: dir.to_path_buf(),
                        source,
                    })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn prepare(&self) -> Result<(), StorageError> {
        self.ensure_parent().await
    }

    async fn load(&self) -> StateMap {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", self.path.display());
                return StateMap::new();
            }
            Err(e) => {
                warn!("Could not read state file {}: {}", self.path.display(), e);
                return StateMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring corrupt state file {}: {}", self.path.display(), e);
                StateMap::new()
            }
        }
    }

    async fn save(&self, state: &StateMap) -> Result<(), StorageError> {
        self.ensure_parent().await?;

        let mut body = serde_json::to_string_pretty(state)?;
        body.push('\n');

        let temp_path = self.temp_path();
        let write_err = |source: std::io::Error| StorageError::Write {
            path: temp_path.clone(),
            source,
        };

        let mut file = fs::File::create(&temp_path).await.map_err(write_err)?;
        file.write_all(body.as_bytes()).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        // The rename is the only write to the final path.
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!("Saved {} entries to {}", state.len(), self.path.display());
        Ok(())
    }
}
