//! Extraction services.
//!
//! This module turns raw source content into facts:
//! - Ranked lists from chart pages (`ranked`)
//! - Latest dated counts from tables (`tabular`)
//! - Latest values from CSV feeds (`csv_latest`)
//!
//! Malformed input is expected; every extractor reports it as `None`.

pub mod csv_latest;
pub mod markup;
pub mod ranked;
pub mod tabular;

pub use csv_latest::{extract_latest_value, extract_paired_date_value};
pub use markup::{HtmlDocument, HtmlNode, MarkupNode};
pub use ranked::extract_ranked;
pub use tabular::{TableLayout, extract_latest_row};

use crate::models::{Fact, RankingPolicy, SourceKind};

/// Extract a fact from raw content according to the source kind.
///
/// An empty ranked snapshot counts as "not found"; a partial one is
/// returned so the caller can judge it.
pub fn extract(kind: &SourceKind, raw: &str, policy: &RankingPolicy) -> Option<Fact> {
    match kind {
        SourceKind::RankedList { ranks } => {
            let doc = HtmlDocument::parse(raw);
            let snapshot = extract_ranked(&doc.root(), ranks, policy);
            (!snapshot.is_empty()).then_some(Fact::Ranked(snapshot))
        }
        SourceKind::TabularLatestRow {
            header_keyword,
            date_column,
            magnitude_column,
            scan_rows,
        } => {
            let doc = HtmlDocument::parse(raw);
            let layout = TableLayout {
                header_keyword,
                date_column: *date_column,
                magnitude_column: *magnitude_column,
                scan_rows: *scan_rows,
            };
            extract_latest_row(&doc.root(), &layout).map(Fact::Dated)
        }
        SourceKind::CsvLatestValue {
            target_columns,
            key_columns,
        } => extract_latest_value(raw, target_columns.as_slice(), key_columns.as_slice())
            .map(Fact::Latest),
        SourceKind::CsvPairedDateValue {
            value_column,
            date_column,
        } => extract_paired_date_value(raw, value_column, date_column).map(Fact::PairedDate),
    }
}
