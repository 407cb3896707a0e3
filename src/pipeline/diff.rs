//! Change detection between the stored and the freshly extracted fact.
//!
//! Pure comparison: nothing here touches storage. A missing prior (first
//! run) establishes a baseline silently.

use crate::models::{DatedMetric, Fact, LatestCsvFact, PairedDateFact, RankedSnapshot};

/// Verdict for one source in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    None,
    Changed,
}

impl ChangeEvent {
    pub fn is_changed(self) -> bool {
        matches!(self, ChangeEvent::Changed)
    }

    fn from_bool(changed: bool) -> Self {
        if changed {
            ChangeEvent::Changed
        } else {
            ChangeEvent::None
        }
    }
}

/// Compare a prior fact with the current one.
///
/// Facts of different kinds never compare as a change.
pub fn detect(prior: Option<&Fact>, current: Option<&Fact>) -> ChangeEvent {
    let (Some(prior), Some(current)) = (prior, current) else {
        return ChangeEvent::None;
    };

    let changed = match (prior, current) {
        (Fact::Ranked(a), Fact::Ranked(b)) => ranked_changed(a, b),
        (Fact::Dated(a), Fact::Dated(b)) => dated_changed(a, b),
        (Fact::Latest(a), Fact::Latest(b)) => latest_changed(a, b),
        (Fact::PairedDate(a), Fact::PairedDate(b)) => paired_changed(a, b),
        _ => {
            log::warn!("Stored fact kind differs from current; treating as baseline");
            false
        }
    };
    ChangeEvent::from_bool(changed)
}

fn ranked_changed(prior: &RankedSnapshot, current: &RankedSnapshot) -> bool {
    prior.items() != current.items()
}

/// Only the date triggers; magnitude-only differences are ignored.
fn dated_changed(prior: &DatedMetric, current: &DatedMetric) -> bool {
    prior.date != current.date
}

fn latest_changed(prior: &LatestCsvFact, current: &LatestCsvFact) -> bool {
    differs_when_both_set(&prior.row_key, &current.row_key)
        || differs_when_both_set(&prior.value, &current.value)
}

fn paired_changed(prior: &PairedDateFact, current: &PairedDateFact) -> bool {
    differs_when_both_set(&prior.normalized_date(), &current.normalized_date())
        || differs_when_both_set(&prior.value, &current.value)
}

/// Empty on either side is a parse hiccup, not a change.
fn differs_when_both_set(prior: &str, current: &str) -> bool {
    let (prior, current) = (prior.trim(), current.trim());
    !prior.is_empty() && !current.is_empty() && prior != current
}
