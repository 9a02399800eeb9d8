//! Batch fetch stage — one task per quizpack key on a bounded worker pool.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::client::QuizApi;
use crate::types::{Event, QuizpackKey, Record, Stage};

/// Records collected from every quizpack that fetched successfully.
pub(crate) struct FetchOutcome {
    /// Records in task-completion order; each key's own order is preserved
    pub(crate) records: Vec<Record>,
    /// Keys whose fetch failed and contributed nothing
    pub(crate) failed_keys: Vec<QuizpackKey>,
    /// Items dropped from successful keys for lacking an ID
    pub(crate) skipped_items: usize,
}

/// Fetch every key with at most `concurrency` requests in flight.
///
/// A failed key is logged and contributes zero records; it never cancels its siblings.
pub(crate) async fn fetch_all(
    api: &Arc<dyn QuizApi>,
    keys: Vec<QuizpackKey>,
    concurrency: usize,
    event_tx: &tokio::sync::broadcast::Sender<Event>,
) -> FetchOutcome {
    let total_keys = keys.len();

    let mut completions = std::pin::pin!(
        stream::iter(keys)
            .map(|key| {
                let api = Arc::clone(api);
                async move {
                    let result = api.fetch_quizpack(&key).await;
                    (key, result)
                }
            })
            .buffer_unordered(concurrency.max(1))
    );

    let mut records = Vec::new();
    let mut failed_keys = Vec::new();
    let mut skipped_items = 0;

    while let Some((key, result)) = completions.next().await {
        match result {
            Ok(batch) => {
                tracing::debug!(
                    stage = %Stage::Fetch,
                    key = %key,
                    records = batch.records.len(),
                    skipped = batch.skipped,
                    "Fetched quizpack"
                );
                skipped_items += batch.skipped;
                records.extend(batch.records);
            }
            Err(e) => {
                tracing::warn!(stage = %Stage::Fetch, key = %key, code = e.code(), error = %e, "Error fetching quizpack");
                event_tx
                    .send(Event::FetchFailed {
                        key: key.clone(),
                        code: e.code(),
                        error: e.to_string(),
                    })
                    .ok();
                failed_keys.push(key);
            }
        }
    }

    tracing::info!(
        stage = %Stage::Fetch,
        keys = total_keys,
        failed_keys = failed_keys.len(),
        skipped_items,
        "Fetched {} questions total",
        records.len()
    );
    event_tx
        .send(Event::RecordsFetched {
            keys: total_keys,
            failed_keys: failed_keys.len(),
            records: records.len(),
            skipped_items,
        })
        .ok();

    FetchOutcome {
        records,
        failed_keys,
        skipped_items,
    }
}
