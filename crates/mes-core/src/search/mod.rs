//! Search layer: federated search over the page catalog and the four
//! remote resource collections.
//!
//! [`search_once`] runs one complete cycle: static catalog match, parallel
//! fan-out to every [`ResourceKind`], per-source filtering, merge and
//! grouping. A source that fails contributes nothing and is reported in
//! [`ResultSet::failed_sources`]; a cycle as a whole never fails.
//!
//! [`SearchAggregator`] wraps cycles in a debounced, cancellable pipeline
//! whose state is published to the presentation layer over a watch channel.

mod aggregator;

pub use aggregator::{Phase, SearchAggregator, SearchKey, SearchState};

use crate::catalog;
use crate::error::SourceError;
use crate::matching::Needle;
use crate::records;
use crate::session::Session;
use crate::types::{ResourceKind, ResultSet};
use futures::future::{join_all, BoxFuture};
use std::future::Future;

/// A backend that can list every record of one resource kind.
///
/// Implementations return the listing as raw JSON values; decoding into the
/// per-kind schema happens in the search layer.
pub trait ResourceSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        kind: ResourceKind,
        session: &'a Session,
    ) -> BoxFuture<'a, Result<Vec<serde_json::Value>, SourceError>>;
}

/// Outcomes of a fixed set of keyed operations, split by success.
#[derive(Debug)]
pub struct Settled<K, T, E> {
    /// Successful outcomes, in issue order.
    pub successes: Vec<(K, T)>,
    /// Failed outcomes, in issue order.
    pub failures: Vec<(K, E)>,
}

/// Drive every future to completion concurrently and partition the outcomes.
///
/// Unlike `try_join_all`, a failure does not short-circuit the others: every
/// future settles, and each outcome keeps the key it was issued with.
pub async fn settle_all<K, T, E, F>(tasks: impl IntoIterator<Item = (K, F)>) -> Settled<K, T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    let outcomes = join_all(futures).await;

    let mut settled = Settled {
        successes: Vec::new(),
        failures: Vec::new(),
    };
    for (key, outcome) in keys.into_iter().zip(outcomes) {
        match outcome {
            Ok(value) => settled.successes.push((key, value)),
            Err(e) => settled.failures.push((key, e)),
        }
    }
    settled
}

/// Run one full search cycle for `query`.
///
/// An empty or whitespace-only query returns an empty set without touching
/// `source`. Without a session every remote source counts as failed.
pub async fn search_once(
    query: &str,
    source: &dyn ResourceSource,
    session: Option<&Session>,
) -> ResultSet {
    let Some(needle) = Needle::new(query) else {
        return ResultSet::empty();
    };

    let mut results = catalog::match_pages(&needle);
    let mut failed_sources = Vec::new();

    match session {
        None => {
            for kind in ResourceKind::ALL {
                tracing::warn!(%kind, error = %SourceError::MissingCredential, "search source failed");
                failed_sources.push(kind);
            }
        }
        Some(session) => {
            let settled = settle_all(
                ResourceKind::ALL
                    .into_iter()
                    .map(|kind| (kind, source.fetch(kind, session))),
            )
            .await;

            for (kind, raw) in settled.successes {
                let matched = records::filter(kind, raw, &needle);
                tracing::debug!(%kind, matched = matched.len(), "search source settled");
                results.extend(matched);
            }
            for (kind, error) in settled.failures {
                tracing::warn!(
                    %kind,
                    %error,
                    credential = error.is_credential_failure(),
                    "search source failed"
                );
                failed_sources.push(kind);
            }
        }
    }

    ResultSet::grouped(needle.as_str(), results, failed_sources)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
