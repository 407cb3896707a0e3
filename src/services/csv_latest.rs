//! Latest-value extraction from CSV feeds.
//!
//! Feeds append rows over time, so the newest record is the last row in
//! file order whose value column is populated. Key and value are always
//! read from that same row.

use csv::{ReaderBuilder, StringRecord};

use crate::models::{LatestCsvFact, PairedDateFact, normalize_date_key};
use crate::utils::looks_like_markup;

const BOM: char = '\u{feff}';

/// A header row plus data rows.
struct CsvTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    /// Parse CSV text. Returns `None` for markup or unreadable input.
    fn parse(text: &str) -> Option<Self> {
        if looks_like_markup(text) {
            log::debug!("CSV body looks like an HTML page; ignoring");
            return None;
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut headers: Vec<String> = match reader.headers() {
            Ok(record) => record.iter().map(str::to_string).collect(),
            Err(e) => {
                log::debug!("CSV header unreadable: {}", e);
                return None;
            }
        };
        if let Some(first) = headers.first_mut() {
            *first = first.trim_start_matches(BOM).to_string();
        }

        let rows = match reader.records().collect::<Result<Vec<_>, _>>() {
            Ok(rows) => rows,
            Err(e) => {
                log::debug!("CSV rows unreadable: {}", e);
                return None;
            }
        };

        Some(Self { headers, rows })
    }

    /// Index of the first candidate name present in the header (case-insensitive).
    fn column<S: AsRef<str>>(&self, candidates: &[S]) -> Option<usize> {
        candidates.iter().find_map(|candidate| {
            let wanted = candidate.as_ref().trim().to_lowercase();
            self.headers
                .iter()
                .position(|h| h.trim().to_lowercase() == wanted)
        })
    }

    /// Trimmed cell value; missing cells read as empty.
    fn cell<'r>(row: &'r StringRecord, column: usize) -> &'r str {
        row.get(column).map(str::trim).unwrap_or("")
    }
}

/// Newest populated value of the first matching target column.
pub fn extract_latest_value<S: AsRef<str>>(
    text: &str,
    target_columns: &[S],
    key_columns: &[S],
) -> Option<LatestCsvFact> {
    let table = CsvTable::parse(text)?;
    let value_col = table.column(target_columns)?;
    let key_col = table.column(key_columns);

    let (index, row) = table
        .rows
        .iter()
        .enumerate()
        .rev()
        .find(|(_, row)| !CsvTable::cell(row, value_col).is_empty())?;

    let row_key = key_col
        .map(|col| CsvTable::cell(row, col))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("row_{}", index + 1));

    Some(LatestCsvFact {
        row_key,
        value: CsvTable::cell(row, value_col).to_string(),
        source_column: table.headers[value_col].trim().to_string(),
    })
}

/// Newest row where both the date and the value column are populated.
pub fn extract_paired_date_value(
    text: &str,
    value_column: &str,
    date_column: &str,
) -> Option<PairedDateFact> {
    let table = CsvTable::parse(text)?;
    let value_col = table.column(&[value_column])?;
    let date_col = table.column(&[date_column])?;

    table.rows.iter().rev().find_map(|row| {
        let value = CsvTable::cell(row, value_col);
        let date = CsvTable::cell(row, date_col);
        if value.is_empty() || date.is_empty() {
            return None;
        }
        Some(PairedDateFact {
            row_key: date.to_string(),
            value: value.to_string(),
            date_iso: normalize_date_key(date),
            source_column: table.headers[value_col].trim().to_string(),
        })
    })
}
