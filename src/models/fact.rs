//! Structured facts extracted from sources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SourceKind;
use crate::utils::{group_thousands, parse_date};

/// One chart position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub rank: u32,
    pub name: String,
}

impl RankedItem {
    pub fn new(rank: u32, name: impl Into<String>) -> Self {
        Self {
            rank,
            name: name.into(),
        }
    }
}

/// Chart positions ordered by rank ascending, each rank at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RankedSnapshot(Vec<RankedItem>);

impl RankedSnapshot {
    /// Build a snapshot, sorting by rank and keeping the first item of each rank.
    pub fn from_items(mut items: Vec<RankedItem>) -> Self {
        items.sort_by_key(|item| item.rank);
        items.dedup_by_key(|item| item.rank);
        Self(items)
    }

    pub fn items(&self) -> &[RankedItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A dated count read from a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedMetric {
    pub date: NaiveDate,

    #[serde(rename = "passengers", alias = "magnitude")]
    pub magnitude: u64,
}

/// The newest populated value of a CSV column.
///
/// `row_key` and `value` always come from the same CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestCsvFact {
    pub row_key: String,

    #[serde(alias = "approval")]
    pub value: String,

    #[serde(default)]
    pub source_column: String,
}

/// The newest CSV row carrying both a date and a value.
///
/// `row_key` keeps the date as written in the feed; `date_iso` is its
/// `YYYY-MM-DD` form used for comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedDateFact {
    pub row_key: String,

    #[serde(alias = "approve")]
    pub value: String,

    #[serde(default)]
    pub date_iso: String,

    #[serde(default)]
    pub source_column: String,
}

impl PairedDateFact {
    /// Comparable form of the date. Unparseable dates compare as written.
    pub fn normalized_date(&self) -> String {
        if !self.date_iso.trim().is_empty() {
            return self.date_iso.trim().to_string();
        }
        normalize_date_key(&self.row_key)
    }
}

/// Canonical `YYYY-MM-DD` form of a feed date, or the trimmed input.
pub fn normalize_date_key(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

/// A fact extracted from one source in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Fact {
    Ranked(RankedSnapshot),
    Dated(DatedMetric),
    Latest(LatestCsvFact),
    PairedDate(PairedDateFact),
}

impl Fact {
    /// Decode a stored record according to the kind of source that wrote it.
    pub fn decode(kind: &SourceKind, record: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            SourceKind::RankedList { .. } => Fact::Ranked(serde_json::from_value(record)?),
            SourceKind::TabularLatestRow { .. } => Fact::Dated(serde_json::from_value(record)?),
            SourceKind::CsvLatestValue { .. } => Fact::Latest(serde_json::from_value(record)?),
            SourceKind::CsvPairedDateValue { .. } => {
                Fact::PairedDate(serde_json::from_value(record)?)
            }
        })
    }

    /// Encode as the opaque record persisted for the source.
    pub fn to_record(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Number of items carried, used for the mandatory-source check.
    pub fn item_count(&self) -> usize {
        match self {
            Fact::Ranked(snapshot) => snapshot.len(),
            _ => 1,
        }
    }

    /// Human-readable rendering used in chat messages.
    pub fn summary(&self) -> String {
        match self {
            Fact::Ranked(snapshot) => snapshot
                .items()
                .iter()
                .map(|item| format!("{}. {}", item.rank, item.name))
                .collect::<Vec<_>>()
                .join("\n"),
            Fact::Dated(metric) => format!(
                "{} — {} passengers",
                metric.date.format("%Y-%m-%d"),
                group_thousands(metric.magnitude)
            ),
            Fact::Latest(fact) => value_with_key(&fact.value, &fact.row_key),
            Fact::PairedDate(fact) => value_with_key(&fact.value, &fact.row_key),
        }
    }
}

fn value_with_key(value: &str, key: &str) -> String {
    if key.is_empty() {
        format!("{value} (latest)")
    } else {
        format!("{value} (latest: {key})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ranked_kind() -> SourceKind {
        SourceKind::RankedList {
            ranks: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_snapshot_orders_and_dedups() {
        let snapshot = RankedSnapshot::from_items(vec![
            RankedItem::new(2, "Beta"),
            RankedItem::new(1, "Alpha"),
            RankedItem::new(2, "Other"),
        ]);
        assert_eq!(
            snapshot.items(),
            &[RankedItem::new(1, "Alpha"), RankedItem::new(2, "Beta")]
        );
    }

    #[test]
    fn test_ranked_record_layout() {
        let fact = Fact::Ranked(RankedSnapshot::from_items(vec![RankedItem::new(
            1, "Alpha",
        )]));
        assert_eq!(
            fact.to_record().unwrap(),
            json!([{ "rank": 1, "name": "Alpha" }])
        );
    }

    #[test]
    fn test_dated_record_layout() {
        let fact = Fact::Dated(DatedMetric {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            magnitude: 2_345_678,
        });
        let record = fact.to_record().unwrap();
        assert_eq!(record, json!({ "date": "2024-01-02", "passengers": 2345678 }));

        let decoded = Fact::decode(
            &SourceKind::TabularLatestRow {
                header_keyword: "date".into(),
                date_column: 0,
                magnitude_column: 1,
                scan_rows: 3,
            },
            record,
        )
        .unwrap();
        assert_eq!(decoded, fact);
    }

    #[test]
    fn test_decode_legacy_approval_record() {
        let kind = SourceKind::CsvLatestValue {
            target_columns: vec!["approval".into()],
            key_columns: vec!["date".into()],
        };
        let decoded = Fact::decode(&kind, json!({ "row_key": "1/2/2024", "approval": "45" }));
        assert_eq!(
            decoded.unwrap(),
            Fact::Latest(LatestCsvFact {
                row_key: "1/2/2024".into(),
                value: "45".into(),
                source_column: String::new(),
            })
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(Fact::decode(&ranked_kind(), json!({ "date": "2024-01-02" })).is_err());
    }

    #[test]
    fn test_summaries() {
        let ranked = Fact::Ranked(RankedSnapshot::from_items(vec![
            RankedItem::new(1, "Alpha"),
            RankedItem::new(2, "Beta"),
        ]));
        assert_eq!(ranked.summary(), "1. Alpha\n2. Beta");

        let dated = Fact::Dated(DatedMetric {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            magnitude: 2_345_678,
        });
        assert_eq!(dated.summary(), "2024-01-02 — 2,345,678 passengers");

        let latest = Fact::Latest(LatestCsvFact {
            row_key: "row_4".into(),
            value: "45".into(),
            source_column: "approval".into(),
        });
        assert_eq!(latest.summary(), "45 (latest: row_4)");
    }

    #[test]
    fn test_paired_normalized_date_falls_back_to_row_key() {
        let fact = PairedDateFact {
            row_key: "1/2/2024".into(),
            value: "45".into(),
            date_iso: String::new(),
            source_column: "approve".into(),
        };
        assert_eq!(fact.normalized_date(), "2024-01-02");
        assert_eq!(normalize_date_key(" Q1 2024 "), "Q1 2024");
    }
}
