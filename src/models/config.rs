//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{SourceConfig, SourceKind};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Health-check cadence
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Ranked-list heuristics
    #[serde(default)]
    pub ranking: RankingPolicy,

    /// Monitored sources, processed in this order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.heartbeat.interval_hours == 0 {
            return Err(AppError::validation("heartbeat.interval_hours must be > 0"));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.ranking.max_name_tokens == 0 {
            return Err(AppError::validation("ranking.max_name_tokens must be > 0"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        keys.insert(self.heartbeat.state_key.as_str());
        for source in &self.sources {
            if !ids.insert(source.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source id '{}'",
                    source.id
                )));
            }
            if !keys.insert(source.state_key.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate state key '{}'",
                    source.state_key
                )));
            }
            url::Url::parse(&source.url)?;
            Self::validate_kind(source)?;
        }
        Ok(())
    }

    fn validate_kind(source: &SourceConfig) -> Result<()> {
        let problem = match &source.kind {
            SourceKind::RankedList { ranks } if ranks.is_empty() => Some("ranks is empty"),
            SourceKind::RankedList { ranks } if ranks.contains(&0) => {
                Some("ranks must be positive")
            }
            SourceKind::RankedList { ranks }
                if ranks.iter().collect::<HashSet<_>>().len() != ranks.len() =>
            {
                Some("ranks must not repeat")
            }
            SourceKind::TabularLatestRow {
                date_column,
                magnitude_column,
                scan_rows,
                ..
            } => {
                if *scan_rows == 0 {
                    Some("scan_rows must be > 0")
                } else if date_column == magnitude_column {
                    Some("date_column and magnitude_column must differ")
                } else {
                    None
                }
            }
            SourceKind::CsvLatestValue { target_columns, .. } if target_columns.is_empty() => {
                Some("target_columns is empty")
            }
            SourceKind::CsvPairedDateValue {
                value_column,
                date_column,
            } if value_column.trim().is_empty() || date_column.trim().is_empty() => {
                Some("value_column and date_column must be set")
            }
            _ => None,
        };

        match problem {
            Some(message) => Err(AppError::validation(format!(
                "source '{}': {}",
                source.id, message
            ))),
            None => Ok(()),
        }
    }

    /// Look up a source by id.
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            telegram: TelegramConfig::default(),
            ranking: RankingPolicy::default(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client settings for source fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header for HTTP requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Health-check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Minimum hours between two health checks
    #[serde(default = "defaults::heartbeat_interval")]
    pub interval_hours: u32,

    /// Key of the persisted last-sent record
    #[serde(default = "defaults::heartbeat_key")]
    pub state_key: String,
}

impl HeartbeatConfig {
    pub fn interval(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.interval_hours))
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_hours: defaults::heartbeat_interval(),
            state_key: defaults::heartbeat_key(),
        }
    }
}

/// Telegram bot settings. Credentials come from the environment only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api")]
    pub api_base: String,

    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Environment variable holding the target chat id
    #[serde(default = "defaults::chat_id_env")]
    pub chat_id_env: String,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api(),
            token_env: defaults::token_env(),
            chat_id_env: defaults::chat_id_env(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Which observation wins when one rank is seen on several links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRank {
    #[default]
    FirstSeen,
    LastSeen,
}

/// Heuristics for reading chart pages.
///
/// Chart markup changes without notice, so these stay configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingPolicy {
    /// Fallback names keep at most this many words
    #[serde(default = "defaults::max_name_tokens")]
    pub max_name_tokens: usize,

    #[serde(default)]
    pub duplicate_rank: DuplicateRank,

    /// Path segment that marks an item detail link
    #[serde(default = "defaults::detail_path_segment")]
    pub detail_path_segment: String,

    /// Identifier marker that must also appear in the link
    #[serde(default = "defaults::id_marker")]
    pub id_marker: String,

    /// Action word stripped from the end of anchor text
    #[serde(default = "defaults::trailing_action_word")]
    pub trailing_action_word: String,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            max_name_tokens: defaults::max_name_tokens(),
            duplicate_rank: DuplicateRank::default(),
            detail_path_segment: defaults::detail_path_segment(),
            id_marker: defaults::id_marker(),
            trailing_action_word: defaults::trailing_action_word(),
        }
    }
}

mod defaults {
    use crate::models::{SourceConfig, SourceKind};

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
         AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.9".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Heartbeat defaults
    pub fn heartbeat_interval() -> u32 {
        4
    }
    pub fn heartbeat_key() -> String {
        "last_heartbeat".into()
    }

    // Telegram defaults
    pub fn telegram_api() -> String {
        "https://api.telegram.org".into()
    }
    pub fn token_env() -> String {
        "TELEGRAM_BOT_TOKEN".into()
    }
    pub fn chat_id_env() -> String {
        "TELEGRAM_CHAT_ID".into()
    }

    // Ranking defaults
    pub fn max_name_tokens() -> usize {
        6
    }
    pub fn detail_path_segment() -> String {
        "/app/".into()
    }
    pub fn id_marker() -> String {
        "id".into()
    }
    pub fn trailing_action_word() -> String {
        "View".into()
    }

    // Source defaults
    pub fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                id: "top_free".to_string(),
                label: "App Store Top Free".to_string(),
                url: "https://apps.apple.com/us/iphone/charts/36?chart=top-free".to_string(),
                state_key: "top3_free".to_string(),
                mandatory: true,
                kind: SourceKind::RankedList {
                    ranks: vec![1, 2, 3],
                },
            },
            SourceConfig {
                id: "top_paid".to_string(),
                label: "App Store Top Paid #1".to_string(),
                url: "https://apps.apple.com/us/iphone/charts/36?chart=top-paid".to_string(),
                state_key: "top1_paid".to_string(),
                mandatory: true,
                kind: SourceKind::RankedList { ranks: vec![1] },
            },
            SourceConfig {
                id: "tsa".to_string(),
                label: "TSA passenger volumes".to_string(),
                url: "https://www.tsa.gov/travel/passenger-volumes".to_string(),
                state_key: "tsa_latest".to_string(),
                mandatory: false,
                kind: SourceKind::TabularLatestRow {
                    header_keyword: "date".to_string(),
                    date_column: 0,
                    magnitude_column: 1,
                    scan_rows: 3,
                },
            },
            SourceConfig {
                id: "approval".to_string(),
                label: "Approval".to_string(),
                url: "https://static.dwcdn.net/data/kSCt4.csv".to_string(),
                state_key: "approval_latest".to_string(),
                mandatory: false,
                kind: SourceKind::CsvLatestValue {
                    target_columns: vec!["approval".to_string(), "approve".to_string()],
                    key_columns: crate::models::source::default_key_columns(),
                },
            },
            SourceConfig {
                id: "trump_approval".to_string(),
                label: "Trump Approval".to_string(),
                url: "https://static.dwcdn.net/data/kSCt4.csv".to_string(),
                state_key: "trump_approval_latest".to_string(),
                mandatory: false,
                kind: SourceKind::CsvPairedDateValue {
                    value_column: "approve".to_string(),
                    date_column: "modeldate".to_string(),
                },
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_state_keys() {
        let mut config = Config::default();
        let mut dup = config.sources[2].clone();
        dup.id = "tsa_copy".to_string();
        config.sources.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_rank() {
        let mut config = Config::default();
        config.sources[0].kind = SourceKind::RankedList { ranks: vec![0, 1] };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.sources[2].url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_mandatory_sources_are_ranked_lists() {
        let config = Config::default();
        let mandatory: Vec<_> = config.sources.iter().filter(|s| s.mandatory).collect();
        assert_eq!(mandatory.len(), 2);
        assert!(
            mandatory
                .iter()
                .all(|s| matches!(s.kind, SourceKind::RankedList { .. }))
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [heartbeat]
            interval_hours = 6

            [ranking]
            max_name_tokens = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.heartbeat.interval_hours, 6);
        assert_eq!(config.heartbeat.state_key, "last_heartbeat");
        assert_eq!(config.ranking.max_name_tokens, 4);
        assert_eq!(config.ranking.duplicate_rank, DuplicateRank::FirstSeen);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.sources.len(), 5);
    }

    #[test]
    fn validate_rejects_duplicate_ranks() {
        let mut config = Config::default();
        let paid = config
            .sources
            .iter_mut()
            .find(|s| s.id == "top_paid")
            .unwrap();
        paid.kind = SourceKind::RankedList { ranks: vec![1, 1] };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ranks must not repeat"), "{err}");
    }
}
