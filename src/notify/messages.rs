//! Chat message bodies for change alerts and health checks.

use crate::models::{Fact, SourceConfig, SourceKind};

/// What the health check shows for one source.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatEntry<'a> {
    pub source: &'a SourceConfig,
    /// Current fact, or the stored one when this run's extraction failed
    pub fact: Option<&'a Fact>,
    /// Whether `fact` comes from storage rather than this run
    pub last_known: bool,
}

fn icon(kind: &SourceKind) -> &'static str {
    match kind {
        SourceKind::RankedList { .. } => "📲",
        SourceKind::TabularLatestRow { .. } => "✈️",
        SourceKind::CsvLatestValue { .. } | SourceKind::CsvPairedDateValue { .. } => "📊",
    }
}

/// Alert body for a detected change.
pub fn change_alert(source: &SourceConfig, prior: &Fact, current: &Fact) -> String {
    let icon = icon(&source.kind);
    match (prior, current) {
        (Fact::Ranked(_), Fact::Ranked(_)) => format!(
            "{icon} {} changed!\n\nBefore:\n{}\n\nNow:\n{}\n\nSource: {}",
            source.label,
            prior.summary(),
            current.summary(),
            source.url
        ),
        _ => format!(
            "{icon} {} updated!\n\nPrevious: {}\nLatest: {}\n\nSource: {}",
            source.label,
            key_value_line(prior),
            key_value_line(current),
            source.url
        ),
    }
}

/// `key — value` rendering used in update alerts.
fn key_value_line(fact: &Fact) -> String {
    match fact {
        Fact::Latest(f) => key_value(&f.row_key, &f.value),
        Fact::PairedDate(f) => key_value(&f.row_key, &f.value),
        other => other.summary(),
    }
}

fn key_value(key: &str, value: &str) -> String {
    let key = if key.is_empty() { "(unknown)" } else { key };
    let value = if value.is_empty() { "(empty)" } else { value };
    format!("{key} — {value}")
}

/// Health-check body listing every source, in order, then their URLs.
pub fn heartbeat(entries: &[HeartbeatEntry<'_>]) -> String {
    let mut sections = Vec::with_capacity(entries.len());
    for entry in entries {
        let icon = icon(&entry.source.kind);
        let label = &entry.source.label;
        let marker = if entry.last_known { " [last known]" } else { "" };
        let section = match entry.fact {
            None => format!("{icon} {label}: (no data yet)"),
            Some(fact @ Fact::Ranked(_)) => {
                format!("{icon} {label}{marker}:\n{}", fact.summary())
            }
            Some(fact) => format!("{icon} {label}: {}{marker}", fact.summary()),
        };
        sections.push(section);
    }

    let links = entries
        .iter()
        .map(|e| format!("{}: {}", e.source.label, e.source.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "✅ Monitor health check\n\n{}\n\n{}",
        sections.join("\n\n"),
        links
    )
}
