// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains configuration, source definitions and the facts
//! extracted from sources.

mod config;
mod fact;
pub(crate) mod source;

// Re-export all public types
pub use config::{
    Config, DuplicateRank, HeartbeatConfig, HttpConfig, RankingPolicy, TelegramConfig,
};
pub use fact::{
    DatedMetric, Fact, LatestCsvFact, PairedDateFact, RankedItem, RankedSnapshot,
    normalize_date_key,
};
pub use source::{SourceConfig, SourceKind};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted record of the last health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatState {
    /// When the last health check was sent
    #[serde(deserialize_with = "utc_or_naive")]
    pub ts: DateTime<Utc>,
}

/// Accept RFC 3339 timestamps and offset-less ones (read as UTC).
fn utc_or_naive<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
