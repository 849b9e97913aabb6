//! Debounced, cancellable search pipeline bound to a text input.
//!
//! Every edit bumps a generation counter stored in the published
//! [`SearchState`] and cancels the previous cycle's token. A cycle waits out
//! the debounce delay, marks the state as loading, runs [`search_once`] and
//! lands its results only if its generation is still current. The
//! generation check and the write happen inside one
//! [`watch::Sender::send_if_modified`] call, so two overlapping cycles can
//! never both believe they are current.
//!
//! While a query is debouncing, the state already holds the catalog matches
//! for that query (they cost nothing to compute), so a confirm keystroke
//! issued before the network settles still lands on a page.

use super::{search_once, ResourceSource};
use crate::catalog;
use crate::matching::Needle;
use crate::session::SessionStore;
use crate::types::{Navigation, ResultGroup, ResultSet, SearchResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Where the pipeline is for the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No query.
    #[default]
    Idle,
    /// Query edited; waiting for it to be stable for the debounce delay.
    Debouncing,
    /// Remote sources queried; not all have settled yet.
    Loading,
    /// Every source settled for the current query.
    Ready,
}

/// Keys the search input reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Enter,
    Escape,
    Other,
}

/// State published to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub is_open: bool,
    /// The text as typed, untrimmed.
    pub query: String,
    pub phase: Phase,
    pub results: ResultSet,
    generation: u64,
}

impl SearchState {
    /// True from the end of the debounce until every source has settled.
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn total_count(&self) -> usize {
        self.results.total_count()
    }

    pub fn grouped_results(&self) -> &[ResultGroup] {
        &self.results.groups
    }

    /// The settled query matched nothing.
    pub fn shows_no_matches(&self) -> bool {
        self.phase == Phase::Ready && self.results.is_empty()
    }
}

struct Shared {
    state: watch::Sender<SearchState>,
}

impl Shared {
    /// Apply `f` only while `generation` is still current.
    fn apply_if_current(&self, generation: u64, f: impl FnOnce(&mut SearchState)) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            f(s);
            true
        })
    }
}

/// Federated search bound to one search box.
pub struct SearchAggregator {
    shared: Arc<Shared>,
    source: Arc<dyn ResourceSource>,
    sessions: SessionStore,
    debounce: Duration,
    runtime: Handle,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl SearchAggregator {
    /// Cycles are spawned on `runtime`, so the callbacks can be driven from a
    /// thread that is not itself inside the runtime (the TUI event loop).
    pub fn new(
        source: Arc<dyn ResourceSource>,
        sessions: SessionStore,
        debounce: Duration,
        runtime: Handle,
    ) -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            shared: Arc::new(Shared { state: tx }),
            source,
            sessions,
            debounce,
            runtime,
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// The search text changed.
    pub fn on_query_change(&self, text: &str) {
        let needle = Needle::new(text);

        let mut in_flight = self.lock_in_flight();
        if let Some(previous) = in_flight.take() {
            previous.cancel();
        }

        let mut generation = 0;
        self.shared.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.query = text.to_string();
            s.is_open = needle.is_some();
            match &needle {
                None => {
                    s.phase = Phase::Idle;
                    s.results = ResultSet::empty();
                }
                Some(n) => {
                    s.phase = Phase::Debouncing;
                    s.results = ResultSet::grouped(n.as_str(), catalog::match_pages(n), Vec::new());
                }
            }
        });

        if needle.is_none() {
            tracing::debug!(generation, "search: query cleared");
            return;
        }

        let cancel = CancellationToken::new();
        *in_flight = Some(cancel.clone());
        drop(in_flight);

        tracing::debug!(generation, query = text, "search: cycle scheduled");
        self.runtime.spawn(run_cycle(
            Arc::clone(&self.shared),
            Arc::clone(&self.source),
            self.sessions.clone(),
            text.to_string(),
            generation,
            self.debounce,
            cancel,
        ));
    }

    /// A result was picked. Returns where to navigate and resets to idle.
    pub fn on_select(&self, result: &SearchResult) -> Navigation {
        tracing::debug!(path = %result.navigation_path, "search: result selected");
        let navigation = Navigation::to(result.navigation_path.clone());
        self.reset(Some(false));
        navigation
    }

    /// `Enter` selects the first result when there is one; `Escape` resets
    /// the query without navigating.
    pub fn on_key_down(&self, key: SearchKey) -> Option<Navigation> {
        match key {
            SearchKey::Enter => {
                let first = self.shared.state.borrow().results.first().cloned();
                first.map(|result| self.on_select(&result))
            }
            SearchKey::Escape => {
                self.reset(Some(false));
                None
            }
            SearchKey::Other => None,
        }
    }

    /// The clear button was pressed.
    pub fn on_clear(&self) {
        self.reset(None);
    }

    /// The search input gained focus: reopen the results for a pending query.
    pub fn on_focus(&self) {
        self.shared.state.send_if_modified(|s| {
            if s.is_open || s.query.trim().is_empty() {
                return false;
            }
            s.is_open = true;
            true
        });
    }

    /// A click or focus change landed outside the search box.
    pub fn on_blur_outside(&self) {
        self.shared.state.send_if_modified(|s| {
            if !s.is_open {
                return false;
            }
            s.is_open = false;
            true
        });
    }

    fn reset(&self, is_open: Option<bool>) {
        let mut in_flight = self.lock_in_flight();
        if let Some(previous) = in_flight.take() {
            previous.cancel();
        }
        self.shared.state.send_modify(|s| {
            s.generation += 1;
            s.query.clear();
            s.phase = Phase::Idle;
            s.results = ResultSet::empty();
            if let Some(open) = is_open {
                s.is_open = open;
            }
        });
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SearchAggregator {
    fn drop(&mut self) {
        if let Some(token) = self.lock_in_flight().take() {
            token.cancel();
        }
    }
}

async fn run_cycle(
    shared: Arc<Shared>,
    source: Arc<dyn ResourceSource>,
    sessions: SessionStore,
    query: String,
    generation: u64,
    debounce: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(debounce) => {}
    }

    if !shared.apply_if_current(generation, |s| s.phase = Phase::Loading) {
        return;
    }

    let session = sessions.current();
    let results = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(generation, "search: cycle cancelled in flight");
            return;
        }
        results = search_once(&query, source.as_ref(), session.as_deref()) => results,
    };

    let total = results.total_count();
    let applied = shared.apply_if_current(generation, move |s| {
        s.results = results;
        s.phase = Phase::Ready;
    });
    if applied {
        tracing::debug!(generation, total, "search: results applied");
    } else {
        tracing::debug!(generation, "search: stale results discarded");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
