//! Snapshot persistence.
//!
//! One opaque JSON record per source plus the heartbeat record.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml               # Monitor configuration
//! └── state/
//!     ├── top3_free.json        # Last known fact per source
//!     ├── tsa_latest.json
//!     └── last_heartbeat.json   # {"ts": "<ISO-8601>"}
//! ```

pub mod local;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::HeartbeatState;

// Re-export for convenience
pub use local::LocalStorage;

/// Key-to-record store for last known facts.
///
/// A missing record means "no prior state". Callers only write records for
/// successful extractions.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the record stored under `key`.
    async fn load_record(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite the record stored under `key`.
    async fn save_record(&self, key: &str, record: &Value) -> Result<()>;

    /// Load the last heartbeat, `None` if never sent or unreadable.
    async fn load_heartbeat(&self, key: &str) -> Result<Option<HeartbeatState>>;

    /// Record that a heartbeat was sent.
    async fn save_heartbeat(&self, key: &str, state: &HeartbeatState) -> Result<()>;
}
