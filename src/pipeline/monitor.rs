// src/pipeline/monitor.rs

//! One monitoring run over every configured source.
//!
//! Every source is fetched and extracted first. A failing mandatory source
//! aborts the run before any alert is sent or record written. Then each
//! source goes through detect → alert → persist on its own; optional
//! sources that failed keep their stored record and show it in the health
//! check.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Config, Fact, HeartbeatState, SourceConfig};
use crate::notify::{Delivery, HeartbeatEntry, Notifier, messages};
use crate::pipeline::diff::{self, ChangeEvent};
use crate::pipeline::heartbeat;
use crate::services;
use crate::storage::SnapshotStore;
use crate::utils::http::Fetcher;

/// What happened to one source during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// No prior record; the fact was stored as the baseline
    Baseline,
    Unchanged,
    /// A change alert was dispatched
    Changed,
    /// Fetch or extraction failed; stored record left untouched
    Failed(String),
}

/// Summary of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Outcomes in source order, keyed by source id
    pub sources: Vec<(String, SourceOutcome)>,
    pub heartbeat_sent: bool,
}

impl RunReport {
    pub fn outcome(&self, source_id: &str) -> Option<&SourceOutcome> {
        self.sources
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn failure_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|(_, o)| matches!(o, SourceOutcome::Failed(_)))
            .count()
    }

    pub fn change_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|(_, o)| *o == SourceOutcome::Changed)
            .count()
    }
}

/// Drives the sources of a configuration through their collaborators.
pub struct Monitor<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    store: &'a dyn SnapshotStore,
    notifier: &'a dyn Notifier,
}

impl<'a> Monitor<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn Fetcher,
        store: &'a dyn SnapshotStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
            notifier,
        }
    }

    /// Run every source once. `now` is the single clock reading for the run.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let sources = &self.config.sources;

        // Stored state is read once, before any source is processed.
        let mut priors = Vec::with_capacity(sources.len());
        for source in sources {
            priors.push(self.load_prior(source).await);
        }
        let last_heartbeat = self.load_last_heartbeat().await;

        // Every source is observed before anything is alerted or persisted,
        // so a failing mandatory source leaves no partial run behind.
        let mut observations = Vec::with_capacity(sources.len());
        for source in sources {
            match self.observe(source).await {
                Err(e) if source.mandatory => {
                    log::error!("Mandatory source '{}' failed: {}", source.id, e);
                    return Err(e);
                }
                observed => observations.push(observed),
            }
        }

        let mut report = RunReport::default();
        let mut currents: Vec<Option<Fact>> = Vec::with_capacity(sources.len());

        for ((source, prior), observed) in sources.iter().zip(&priors).zip(observations) {
            match observed {
                Ok(fact) => {
                    let outcome = self.settle(source, prior.as_ref(), &fact).await;
                    report.sources.push((source.id.clone(), outcome));
                    currents.push(Some(fact));
                }
                Err(e) => {
                    log::warn!(
                        "Source '{}' failed: {}. Keeping last known state.",
                        source.id,
                        e
                    );
                    report
                        .sources
                        .push((source.id.clone(), SourceOutcome::Failed(e.to_string())));
                    currents.push(None);
                }
            }
        }

        report.heartbeat_sent = self
            .maybe_heartbeat(last_heartbeat, now, &priors, &currents)
            .await;

        log::info!(
            "Run complete: {} sources, {} changed, {} failed, heartbeat {}",
            report.sources.len(),
            report.change_count(),
            report.failure_count(),
            if report.heartbeat_sent { "sent" } else { "skipped" }
        );
        Ok(report)
    }

    /// Fetch and extract one source. Too few items counts as a failure.
    async fn observe(&self, source: &SourceConfig) -> Result<Fact> {
        let raw = self.fetcher.fetch(&source.url).await?;
        log::debug!("{}: extracting as {}", source.id, source.kind.name());
        let required = source.kind.required_items();
        let fact = services::extract(&source.kind, &raw, &self.config.ranking);
        let found = fact.as_ref().map_or(0, Fact::item_count);

        match fact {
            Some(fact) if found >= required => {
                log::info!("{}: {}", source.id, fact.summary().replace('\n', "; "));
                Ok(fact)
            }
            partial => {
                if let Some(fact) = partial {
                    log::warn!("{} partial result: {}", source.id, fact.summary());
                }
                let source_id = source.id.clone();
                Err(if source.mandatory {
                    AppError::MandatorySource {
                        source_id,
                        found,
                        required,
                    }
                } else {
                    AppError::Extraction {
                        source_id,
                        found,
                        required,
                    }
                })
            }
        }
    }

    /// Compare with the prior fact, alert on change, then persist.
    async fn settle(&self, source: &SourceConfig, prior: Option<&Fact>, current: &Fact) -> SourceOutcome {
        let outcome = match (prior, diff::detect(prior, Some(current))) {
            (None, _) => {
                log::info!("{}: no prior state, storing baseline", source.id);
                SourceOutcome::Baseline
            }
            (Some(prior), ChangeEvent::Changed) => {
                log::info!("{}: change detected", source.id);
                self.dispatch(&messages::change_alert(source, prior, current))
                    .await;
                SourceOutcome::Changed
            }
            (Some(_), ChangeEvent::None) => {
                log::info!("{}: no change", source.id);
                SourceOutcome::Unchanged
            }
        };

        let saved = match current.to_record() {
            Ok(record) => self.store.save_record(&source.state_key, &record).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = saved {
            log::error!("{}: failed to persist state: {}", source.id, e);
        }

        outcome
    }

    /// Send the health check if due and record when it went out.
    async fn maybe_heartbeat(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        priors: &[Option<Fact>],
        currents: &[Option<Fact>],
    ) -> bool {
        if !heartbeat::is_due(last, now, self.config.heartbeat.interval()) {
            log::info!("Heartbeat skipped (interval not reached)");
            return false;
        }

        let entries: Vec<HeartbeatEntry<'_>> = self
            .config
            .sources
            .iter()
            .zip(priors.iter().zip(currents))
            .map(|(source, (prior, current))| HeartbeatEntry {
                source,
                fact: current.as_ref().or(prior.as_ref()),
                last_known: current.is_none() && prior.is_some(),
            })
            .collect();

        self.dispatch(&messages::heartbeat(&entries)).await;

        let state = HeartbeatState { ts: now };
        if let Err(e) = self
            .store
            .save_heartbeat(&self.config.heartbeat.state_key, &state)
            .await
        {
            log::error!("Failed to persist heartbeat timestamp: {}", e);
        }
        log::info!("Heartbeat sent");
        true
    }

    /// Deliver a message; failures are logged and swallowed.
    async fn dispatch(&self, text: &str) {
        match self.notifier.send(text).await {
            Ok(Delivery::Sent) => log::debug!("Message delivered"),
            Ok(Delivery::Skipped) => log::debug!("Message skipped"),
            Err(e) => log::warn!("{}", e),
        }
    }

    async fn load_prior(&self, source: &SourceConfig) -> Option<Fact> {
        let record = match self.store.load_record(&source.state_key).await {
            Ok(record) => record?,
            Err(e) => {
                log::warn!("{}: cannot read stored state: {}", source.id, e);
                return None;
            }
        };
        match Fact::decode(&source.kind, record) {
            Ok(fact) => Some(fact),
            Err(e) => {
                log::warn!("{}: ignoring malformed stored state: {}", source.id, e);
                None
            }
        }
    }

    async fn load_last_heartbeat(&self) -> Option<DateTime<Utc>> {
        match self
            .store
            .load_heartbeat(&self.config.heartbeat.state_key)
            .await
        {
            Ok(state) => state.map(|s| s.ts),
            Err(e) => {
                log::warn!("Cannot read heartbeat state: {}", e);
                None
            }
        }
    }
}
