//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── state/
//!     └── {key}.json        # Pretty-printed UTF-8 JSON record
//! ```
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! crash mid-write leaves the previous record intact.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::HeartbeatState;
use crate::storage::SnapshotStore;

const STATE_DIR: &str = "state";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Full path of the record file for a key.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(STATE_DIR).join(format!("{key}.json"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(&self.record_path(key), &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data. Unparseable content reads as absent.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.read_bytes(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable record {}: {}",
                    self.record_path(key).display(),
                    e
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_record(&self, key: &str) -> Result<Option<Value>> {
        self.read_json(key).await
    }

    async fn save_record(&self, key: &str, record: &Value) -> Result<()> {
        self.write_json(key, record).await
    }

    async fn load_heartbeat(&self, key: &str) -> Result<Option<HeartbeatState>> {
        self.read_json(key).await
    }

    async fn save_heartbeat(&self, key: &str, state: &HeartbeatState) -> Result<()> {
        self.write_json(key, state).await
    }
}
