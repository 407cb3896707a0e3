//! Monitored source definitions.

use serde::{Deserialize, Serialize};

/// One monitored source: where to fetch it, how to read it, where to keep its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier used in logs and reports
    pub id: String,

    /// Display label used in chat messages
    pub label: String,

    /// URL fetched on every run
    pub url: String,

    /// Key of the persisted record (file stem under `state/`)
    pub state_key: String,

    /// A mandatory source aborts the run when it cannot be extracted
    #[serde(default)]
    pub mandatory: bool,

    /// Extractor selection and its parameters
    pub kind: SourceKind,
}

/// Extractor selection for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Chart page with numbered item links.
    RankedList {
        /// Ranks to capture, e.g. `[1, 2, 3]`
        ranks: Vec<u32>,
    },

    /// Page with a newest-first table of dated counts.
    TabularLatestRow {
        /// Keyword the header row must contain (case-insensitive)
        #[serde(default = "default_header_keyword")]
        header_keyword: String,

        /// Cell index holding the date
        #[serde(default)]
        date_column: usize,

        /// Cell index holding the count
        #[serde(default = "default_magnitude_column")]
        magnitude_column: usize,

        /// Number of data rows inspected below the header
        #[serde(default = "default_scan_rows")]
        scan_rows: usize,
    },

    /// CSV feed whose newest row holds the value of interest.
    CsvLatestValue {
        /// Acceptable names of the value column, in priority order
        target_columns: Vec<String>,

        /// Acceptable names of the row key column, in priority order
        #[serde(default = "default_key_columns")]
        key_columns: Vec<String>,
    },

    /// CSV feed whose newest row must carry both a date and a value.
    CsvPairedDateValue {
        value_column: String,
        date_column: String,
    },
}

impl SourceKind {
    /// Minimum item count a successful extraction must reach.
    pub fn required_items(&self) -> usize {
        match self {
            SourceKind::RankedList { ranks } => ranks.len(),
            _ => 1,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::RankedList { .. } => "ranked_list",
            SourceKind::TabularLatestRow { .. } => "tabular_latest_row",
            SourceKind::CsvLatestValue { .. } => "csv_latest_value",
            SourceKind::CsvPairedDateValue { .. } => "csv_paired_date_value",
        }
    }
}

fn default_header_keyword() -> String {
    "date".to_string()
}

fn default_magnitude_column() -> usize {
    1
}

fn default_scan_rows() -> usize {
    3
}

pub(crate) fn default_key_columns() -> Vec<String> {
    ["date", "day", "week", "month", "timestamp", "time"]
        .into_iter()
        .map(String::from)
        .collect()
}
