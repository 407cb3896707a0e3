//! Utility functions and helpers.

pub mod http;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Date layouts tried in priority order: `M/D/YYYY`, `M/D/YY`, `YYYY-MM-DD`.
static DATE_PATTERNS: LazyLock<[(Regex, DateLayout); 3]> = LazyLock::new(|| {
    [
        (
            Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"),
            DateLayout::MonthDayYear,
        ),
        (
            Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").expect("valid regex"),
            DateLayout::MonthDayShortYear,
        ),
        (
            Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"),
            DateLayout::YearMonthDay,
        ),
    ]
});

#[derive(Clone, Copy)]
enum DateLayout {
    MonthDayYear,
    MonthDayShortYear,
    YearMonthDay,
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a calendar date written in one of the known feed layouts.
///
/// Two-digit years follow the POSIX pivot: 69-99 map to 19xx, 00-68 to 20xx.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_PATTERNS.iter().find_map(|(pattern, layout)| {
        let caps = pattern.captures(s)?;
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let c: i32 = caps[3].parse().ok()?;
        match layout {
            DateLayout::MonthDayYear => NaiveDate::from_ymd_opt(c, a, b),
            DateLayout::MonthDayShortYear => {
                let year = if c >= 69 { 1900 + c } else { 2000 + c };
                NaiveDate::from_ymd_opt(year, a, b)
            }
            DateLayout::YearMonthDay => NaiveDate::from_ymd_opt(a as i32, b, c as u32),
        }
    })
}

/// Parse a non-negative count, ignoring thousands separators and whitespace.
pub fn parse_count(s: &str) -> Option<u64> {
    let digits: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Format a count with comma thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whether text looks like an HTML page rather than data.
pub fn looks_like_markup(text: &str) -> bool {
    let head: String = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
