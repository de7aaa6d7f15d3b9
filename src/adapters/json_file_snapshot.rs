//! JSON file implementation of SnapshotStore.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};
use crate::ports::{Snapshot, SnapshotStore, SNAPSHOT_VERSION};

/// Writes the whole snapshot to a sibling temp file, syncs it, then renames
/// it over the target so a crash never leaves a torn file behind.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> AppResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting empty");
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(AppError::Storage(format!(
                "Unsupported snapshot version {} in {}",
                snapshot.version,
                self.path.display()
            )));
        }

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Storage(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create temp snapshot: {}", e)))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write snapshot: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to sync snapshot: {}", e)))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to move snapshot into place: {}", e)))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot flushed");
        Ok(())
    }
}
