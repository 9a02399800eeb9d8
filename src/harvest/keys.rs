//! Key discovery across category filters.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::client::QuizApi;
use crate::config::DuplicateKeyPolicy;
use crate::error::{Error, Result};
use crate::types::{Event, QuizpackKey, Stage};

/// Query every category filter in order and return the union of their keys.
///
/// Any filter failure aborts discovery with [`Error::Enumeration`]; there is no
/// partial result. With [`DuplicateKeyPolicy::Keep`] a key listed under several
/// filters appears once per filter.
pub(crate) async fn discover_keys(
    api: &dyn QuizApi,
    categories: &[String],
    policy: DuplicateKeyPolicy,
    event_tx: &tokio::sync::broadcast::Sender<Event>,
) -> Result<Vec<QuizpackKey>> {
    let mut keys = Vec::new();

    for filter in categories {
        let found = match api.discover_keys(filter).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(
                    stage = %Stage::Discover,
                    filter = %filter,
                    code = e.code(),
                    error = %e,
                    "Key discovery failed"
                );
                return Err(Error::enumeration(filter.as_str(), e));
            }
        };

        tracing::debug!(stage = %Stage::Discover, filter = %filter, count = found.len(), "Discovered keys");
        event_tx
            .send(Event::KeysDiscovered {
                filter: filter.clone(),
                count: found.len(),
            })
            .ok();
        keys.extend(found);
    }

    if policy == DuplicateKeyPolicy::Skip {
        let before = keys.len();
        let mut seen = HashSet::with_capacity(before);
        keys.retain(|key| seen.insert(key.clone()));

        let skipped = before - keys.len();
        if skipped > 0 {
            warn!(stage = %Stage::Discover, skipped, "Skipped keys listed under more than one category");
            event_tx
                .send(Event::DuplicateKeysSkipped { count: skipped })
                .ok();
        }
    }

    info!(stage = %Stage::Discover, keys = keys.len(), "Found {} quizpack keys", keys.len());
    Ok(keys)
}
