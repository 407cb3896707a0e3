//! Latest-row extraction from newest-first tables.

use crate::models::DatedMetric;
use crate::services::markup::MarkupNode;
use crate::utils::{parse_count, parse_date};

/// Where to look inside a table.
#[derive(Debug, Clone)]
pub struct TableLayout<'a> {
    /// Keyword the header row must contain (matched lower-cased)
    pub header_keyword: &'a str,
    pub date_column: usize,
    pub magnitude_column: usize,
    /// Data rows inspected below the header
    pub scan_rows: usize,
}

impl Default for TableLayout<'_> {
    fn default() -> Self {
        Self {
            header_keyword: "date",
            date_column: 0,
            magnitude_column: 1,
            scan_rows: 3,
        }
    }
}

/// Read the newest dated count from the first table whose header matches.
///
/// Only the first matching table is used; lower tables hold other statistics.
pub fn extract_latest_row<N: MarkupNode>(root: &N, layout: &TableLayout<'_>) -> Option<DatedMetric> {
    let keyword = layout.header_keyword.to_lowercase();

    for table in root.find_all(&["table"]) {
        let rows = table.find_all(&["tr"]);
        let [header, _, ..] = rows.as_slice() else {
            continue;
        };
        if !header.text().to_lowercase().contains(&keyword) {
            continue;
        }

        let latest = rows
            .iter()
            .skip(1)
            .take(layout.scan_rows)
            .find_map(|row| parse_row(row, layout));
        if latest.is_none() {
            log::debug!(
                "Table matching '{}' has no parseable row in the first {}",
                keyword,
                layout.scan_rows
            );
        }
        return latest;
    }

    None
}

fn parse_row<N: MarkupNode>(row: &N, layout: &TableLayout<'_>) -> Option<DatedMetric> {
    let cells: Vec<String> = row.find_all(&["td", "th"]).iter().map(|c| c.text()).collect();
    let date = parse_date(cells.get(layout.date_column)?)?;
    let magnitude = parse_count(cells.get(layout.magnitude_column)?)?;
    Some(DatedMetric { date, magnitude })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::services::markup::HtmlDocument;

    fn extract(html: &str) -> Option<DatedMetric> {
        let doc = HtmlDocument::parse(html);
        extract_latest_row(&doc.root(), &TableLayout::default())
    }

    fn metric(y: i32, m: u32, d: u32, n: u64) -> DatedMetric {
        DatedMetric {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            magnitude: n,
        }
    }

    #[test]
    fn test_first_parseable_row() {
        let html = r#"
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>1/2/2024</td><td>2,345,678</td></tr>
              <tr><td>1/1/2024</td><td>2,000,000</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), Some(metric(2024, 1, 2, 2_345_678)));
    }

    #[test]
    fn test_skips_table_without_keyword() {
        let html = r#"
            <table>
              <tr><th>Airport</th><th>Travelers</th></tr>
              <tr><td>1/5/2024</td><td>99</td></tr>
            </table>
            <table>
              <tr><th>DATE</th><th>Numbers</th></tr>
              <tr><td>01/03/24</td><td>1 234</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), Some(metric(2024, 1, 3, 1234)));
    }

    #[test]
    fn test_uses_only_first_matching_table() {
        let html = r#"
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>n/a</td><td>-</td></tr>
            </table>
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>2024-01-02</td><td>5</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), None);
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let html = r#"
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>pending</td><td></td></tr>
              <tr><td>pending</td><td></td></tr>
              <tr><td>pending</td><td></td></tr>
              <tr><td>1/1/2024</td><td>10</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), None);

        let doc = HtmlDocument::parse(html);
        let layout = TableLayout {
            scan_rows: 4,
            ..TableLayout::default()
        };
        assert_eq!(
            extract_latest_row(&doc.root(), &layout),
            Some(metric(2024, 1, 1, 10))
        );
    }

    #[test]
    fn test_skips_short_and_bad_rows_within_window() {
        let html = r#"
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>1/3/2024</td></tr>
              <tr><td>1/2/2024</td><td>12.5</td></tr>
              <tr><td>1/1/2024</td><td>7</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), Some(metric(2024, 1, 1, 7)));
    }

    #[test]
    fn test_header_only_table_is_not_a_match() {
        let html = r#"
            <table><tr><th>Date</th><th>Numbers</th></tr></table>
            <table>
              <tr><th>Date</th><th>Numbers</th></tr>
              <tr><td>1/1/2024</td><td>7</td></tr>
            </table>
        "#;
        assert_eq!(extract(html), Some(metric(2024, 1, 1, 7)));
    }

    #[test]
    fn test_no_tables() {
        assert_eq!(extract("<p>Service unavailable</p>"), None);
    }
}
