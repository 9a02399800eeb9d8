//! Enrichment stage — one option lookup per record on a bounded worker pool.
//!
//! Lookups never drop a record: a failed lookup is replaced by an empty
//! [`OptionSet`], so the sink always receives exactly one row per record.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::client::QuizApi;
use crate::types::{EnrichedRow, Event, OptionSet, Record, Stage};

use super::sink::ResultSink;

/// Counts reported once every record has been enriched.
pub(crate) struct EnrichOutcome {
    /// Rows handed to the sink
    pub(crate) rows: usize,
    /// Lookups that failed and were replaced by an empty option set
    pub(crate) failed: usize,
}

/// A progress report emitted by [`ProgressTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProgressTick {
    pub(crate) completed: usize,
    pub(crate) total: usize,
    pub(crate) percent: f32,
}

/// Counts completions against the total fixed at dispatch time.
///
/// Reports after every `interval`-th completion and once more at the final one.
pub(crate) struct ProgressTracker {
    total: usize,
    interval: usize,
    completed: usize,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize, interval: usize) -> Self {
        Self {
            total,
            interval: interval.max(1),
            completed: 0,
        }
    }

    /// Count one completion, returning a tick when one is due.
    pub(crate) fn complete_one(&mut self) -> Option<ProgressTick> {
        self.completed += 1;
        if self.completed % self.interval == 0 || self.completed == self.total {
            Some(ProgressTick {
                completed: self.completed,
                total: self.total,
                percent: self.completed as f32 / self.total.max(1) as f32 * 100.0,
            })
        } else {
            None
        }
    }
}

/// Enrich every record with at most `concurrency` lookups in flight, pushing rows
/// into `sink` in completion order.
pub(crate) async fn enrich_all(
    api: &Arc<dyn QuizApi>,
    records: Vec<Record>,
    concurrency: usize,
    progress_interval: usize,
    sink: &mut ResultSink,
    event_tx: &tokio::sync::broadcast::Sender<Event>,
) -> EnrichOutcome {
    let total = records.len();
    let mut progress = ProgressTracker::new(total, progress_interval);
    let mut failed = 0;
    let mut rows = 0;

    let mut completions = std::pin::pin!(
        stream::iter(records)
            .map(|record| {
                let api = Arc::clone(api);
                async move {
                    let result = api.fetch_options(&record.id).await;
                    (record, result)
                }
            })
            .buffer_unordered(concurrency.max(1))
    );

    while let Some((record, result)) = completions.next().await {
        let options = match result {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(
                    stage = %Stage::Enrich,
                    record_id = %record.id,
                    code = e.code(),
                    error = %e,
                    timeout = e.is_timeout(),
                    "Error fetching options"
                );
                event_tx
                    .send(Event::EnrichFailed {
                        record_id: record.id.clone(),
                        code: e.code(),
                        error: e.to_string(),
                    })
                    .ok();
                failed += 1;
                OptionSet::default()
            }
        };

        sink.push(EnrichedRow::merge(record, options));
        rows += 1;

        if let Some(tick) = progress.complete_one() {
            tracing::info!(
                stage = %Stage::Enrich,
                completed = tick.completed,
                total = tick.total,
                "Progress: {}/{} ({:.0}%)",
                tick.completed,
                tick.total,
                tick.percent
            );
            event_tx
                .send(Event::Progress {
                    completed: tick.completed,
                    total: tick.total,
                    percent: tick.percent,
                })
                .ok();
        }
    }

    EnrichOutcome { rows, failed }
}
