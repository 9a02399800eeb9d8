//! Harvest pipeline — key discovery, batch fetch, enrichment, serialization.
//!
//! Split into focused submodules:
//! - [`keys`] - Key discovery across category filters (fatal on failure)
//! - [`fetch`] - Bounded-concurrency quizpack fetch (failed keys contribute nothing)
//! - [`enrich`] - Bounded-concurrency option lookup (failed lookups get an empty option set)
//! - [`sink`] - Row accumulation and CSV output
//!
//! Stages run strictly one after another; each is fully materialized before the next starts.

mod enrich;
mod fetch;
mod keys;
mod sink;


use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::client::{HttpQuizApi, QuizApi};
use crate::config::Config;
use crate::error::Result;
use crate::types::{Event, Stage};

pub use sink::{CSV_HEADER, ResultSink};

/// Buffer size for the event broadcast channel
const EVENT_CHANNEL_BUFFER: usize = 1000;

/// Counts describing a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Keys dispatched to the fetch stage
    pub keys: usize,
    /// Keys whose fetch failed
    pub failed_keys: usize,
    /// Quizpack items dropped because they carried no ID
    pub skipped_items: usize,
    /// Records that reached the enrichment stage
    pub records: usize,
    /// Option lookups that failed and were replaced by an empty option set
    pub failed_lookups: usize,
    /// Rows written
    pub rows: usize,
    /// Output file
    pub output_path: PathBuf,
}

/// Runs one harvest: discover keys, fetch quizpacks, enrich records, write CSV.
///
/// The API handle is shared by every worker in both pools. Progress and per-task
/// failures are published as [`Event`]s to subscribers and logged via `tracing`.
pub struct Harvester {
    api: Arc<dyn QuizApi>,
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
}

impl Harvester {
    /// Create a harvester talking to the configured HTTP API
    ///
    /// # Errors
    /// Returns a configuration error if the config fails validation or the HTTP
    /// client cannot be built from it.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api = HttpQuizApi::new(&config.api)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Create a harvester over any [`QuizApi`] implementation
    pub fn with_api(config: Config, api: Arc<dyn QuizApi>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_BUFFER);
        Self {
            api,
            config: Arc::new(config),
            event_tx,
        }
    }

    /// Subscribe to run events
    ///
    /// Slow subscribers may miss events (`RecvError::Lagged`); the run never waits on them.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this harvester runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run discovery, fetch and enrichment, returning the collected rows without writing them
    ///
    /// # Errors
    /// Fails only when key discovery fails; fetch and lookup failures are isolated.
    pub async fn collect(&self) -> Result<(ResultSink, HarvestSummary)> {
        let pipeline = &self.config.pipeline;

        let keys = keys::discover_keys(
            self.api.as_ref(),
            &pipeline.categories,
            pipeline.duplicate_keys,
            &self.event_tx,
        )
        .await?;
        let key_count = keys.len();

        let fetched = fetch::fetch_all(
            &self.api,
            keys,
            pipeline.fetch_concurrency,
            &self.event_tx,
        )
        .await;
        let record_count = fetched.records.len();

        let mut sink = ResultSink::with_capacity(record_count);
        let enriched = enrich::enrich_all(
            &self.api,
            fetched.records,
            pipeline.enrich_concurrency,
            pipeline.progress_interval,
            &mut sink,
            &self.event_tx,
        )
        .await;

        let summary = HarvestSummary {
            keys: key_count,
            failed_keys: fetched.failed_keys.len(),
            skipped_items: fetched.skipped_items,
            records: record_count,
            failed_lookups: enriched.failed,
            rows: enriched.rows,
            output_path: self.config.output_path.clone(),
        };
        Ok((sink, summary))
    }

    /// Run the full pipeline and write the CSV output
    ///
    /// # Errors
    /// Fails when key discovery fails (no file is written) or the output cannot be written.
    pub async fn run(&self) -> Result<HarvestSummary> {
        let (sink, mut summary) = self.collect().await?;

        let path = self.config.output_path.clone();
        let rows = match sink.save(&path).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(stage = %Stage::Write, path = %path.display(), code = e.code(), error = %e, "Failed to write output");
                return Err(e);
            }
        };
        summary.rows = rows;

        tracing::info!(stage = %Stage::Write, rows, "Saved {} rows to {}", rows, path.display());
        self.event_tx
            .send(Event::Completed {
                rows,
                path: path.clone(),
            })
            .ok();

        Ok(summary)
    }
}
