use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logscope_types::{
    AggregateStats, FilterState, SessionState, SharedRecord, SourceError,
};

use crate::source::{LogSource, SourceQuery};
use crate::{aggregate, export, filter, ingest};

/// Query session tuning
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Interval between automatic refreshes while live
    pub refresh_interval: Duration,

    /// Upper bound on one log source query
    pub fetch_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Mutable session state, serialized behind one lock
struct Inner {
    filter: FilterState,

    /// Most recently fetched record set for the active time range
    records: Vec<SharedRecord>,

    /// Derived subset after applying search/service/level filters
    visible: Vec<SharedRecord>,

    state: SessionState,

    /// Whether periodic refresh is enabled
    live: bool,

    /// Cancels the live refresh timer; replaced on each re-arm
    live_cancel: Option<CancellationToken>,

    last_error: Option<SourceError>,

    /// Malformed records dropped from the last accepted batch
    rejected: usize,
}

impl Inner {
    fn recompute_view(&mut self) {
        self.visible = filter::apply(&self.records, &self.filter);
    }
}

/// Shared guts of a session, cheap to clone into spawned tasks
struct Core<S> {
    source: Arc<S>,
    inner: Arc<RwLock<Inner>>,

    /// Monotonic fetch generation; only the most recently issued fetch
    /// may commit its result
    generation: Arc<AtomicU64>,

    config: SessionConfig,
}

impl<S> Clone for Core<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            inner: Arc::clone(&self.inner),
            generation: Arc::clone(&self.generation),
            config: self.config.clone(),
        }
    }
}

impl<S: LogSource> Core<S> {
    /// Issue a generation-tagged fetch, superseding any in-flight one
    fn issue_fetch(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let mut inner = self.inner.write();
            inner.state = SessionState::Loading;
            SourceQuery::from_filter(&inner.filter, Utc::now())
        };
        debug!(generation, ?query, "issuing log source fetch");

        let core = self.clone();
        tokio::spawn(async move {
            core.run_fetch(generation, query).await;
        });
    }

    async fn run_fetch(self, generation: u64, query: SourceQuery) {
        let result = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.source.query(query),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.fetch_timeout)),
        };

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if self.generation.load(Ordering::SeqCst) != generation {
            // Superseded by a newer fetch; discard this result
            debug!(generation, "discarding superseded fetch result");
            return;
        }

        match result {
            Ok(batch) => {
                let report = ingest::ingest(batch);
                if report.rejected > 0 {
                    warn!(
                        rejected = report.rejected,
                        accepted = report.records.len(),
                        "fetched batch contained malformed records"
                    );
                }
                debug!(generation, count = report.records.len(), "fetch succeeded");
                inner.rejected = report.rejected;
                inner.records = report.records;
                inner.recompute_view();
                inner.last_error = None;
                inner.state = if inner.live {
                    SessionState::Live
                } else {
                    SessionState::Idle
                };
            }
            Err(e) => {
                // Stale-but-available data beats a cleared view: the stored
                // record set is left untouched
                warn!(generation, error = %e, "log source fetch failed");
                inner.last_error = Some(e);
                inner.state = SessionState::Error;
            }
        }
    }
}

/// A log query session: owns one filter state, the current record set, the
/// derived visible view, and the live refresh timer.
///
/// Control operations are non-blocking and stay available while a fetch is
/// outstanding; filter mutation, fetch completion, and timer firing all
/// serialize against the same internal state. Sessions are independent:
/// nothing is shared between two sessions.
pub struct QuerySession<S> {
    core: Core<S>,
}

impl<S: LogSource> QuerySession<S> {
    /// Create a session with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, SessionConfig::default())
    }

    pub fn with_config(source: S, config: SessionConfig) -> Self {
        Self {
            core: Core {
                source: Arc::new(source),
                inner: Arc::new(RwLock::new(Inner {
                    filter: FilterState::default(),
                    records: Vec::new(),
                    visible: Vec::new(),
                    state: SessionState::Idle,
                    live: false,
                    live_cancel: None,
                    last_error: None,
                    rejected: 0,
                })),
                generation: Arc::new(AtomicU64::new(0)),
                config,
            },
        }
    }

    /// Fetch a fresh record set for the current filter's time range.
    ///
    /// A no-op while a fetch is already in flight.
    pub fn fetch(&self) {
        if self.core.inner.read().state == SessionState::Loading {
            return;
        }
        self.core.issue_fetch();
    }

    /// Enable or disable live mode.
    ///
    /// While enabled, a periodic timer schedules refreshes; disabling
    /// cancels the timer race-free (a fetch started by a just-cancelled
    /// timer cannot resurrect live mode). Toggling never triggers an
    /// immediate fetch by itself.
    pub fn toggle_live(&self, on: bool) {
        let mut inner = self.core.inner.write();
        if inner.live == on {
            return;
        }
        inner.live = on;

        if let Some(cancel) = inner.live_cancel.take() {
            cancel.cancel();
        }

        if on {
            let cancel = CancellationToken::new();
            inner.live_cancel = Some(cancel.clone());
            drop(inner);

            let core = self.core.clone();
            let period = core.config.refresh_interval;
            tokio::spawn(async move {
                // interval_at: the first tick is one full period out, so
                // arming the timer does not fetch immediately
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        _ = interval.tick() => {
                            // Skip if a fetch is already in flight
                            if core.inner.read().state != SessionState::Loading {
                                core.issue_fetch();
                            }
                        }
                    }
                }
            });
        } else if inner.state == SessionState::Live {
            inner.state = SessionState::Idle;
        }
    }

    /// Replace the filter state.
    ///
    /// Search/service/level changes recompute the view over the existing
    /// record set without touching the source; a time-range change
    /// re-fetches, superseding any in-flight request (time semantics are
    /// source-side).
    pub fn set_filter(&self, new_filter: FilterState) {
        let time_range_changed = {
            let mut guard = self.core.inner.write();
            let inner = &mut *guard;
            let changed = inner.filter.time_range != new_filter.time_range;
            inner.filter = new_filter;
            if !changed {
                inner.recompute_view();
            }
            changed
        };

        if time_range_changed {
            self.core.issue_fetch();
        }
    }

    /// Export the current scope as CSV.
    ///
    /// Re-queries the source with the current time range and service/level
    /// constraints. The free-text search term is deliberately not applied:
    /// the export scope is exactly the server-side scope, so an export is
    /// never truncated to the view's text filter. On failure no partial
    /// output is produced.
    pub async fn export(&self) -> Result<Vec<u8>, SourceError> {
        let query = SourceQuery::from_filter(&self.core.inner.read().filter, Utc::now());
        debug!(?query, "issuing export query");

        let batch = match tokio::time::timeout(
            self.core.config.fetch_timeout,
            self.core.source.query(query),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(SourceError::Timeout(self.core.config.fetch_timeout)),
        };

        let report = ingest::ingest(batch);
        if report.rejected > 0 {
            warn!(rejected = report.rejected, "export batch contained malformed records");
        }
        Ok(export::to_csv(&report.records))
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.core.inner.read().state
    }

    /// Whether live mode is enabled
    pub fn is_live(&self) -> bool {
        self.core.inner.read().live
    }

    /// Snapshot of the current filter state
    pub fn filter(&self) -> FilterState {
        self.core.inner.read().filter.clone()
    }

    /// The current visible view (record set after search/service/level)
    pub fn visible(&self) -> Vec<SharedRecord> {
        self.core.inner.read().visible.clone()
    }

    /// Aggregate statistics over the visible view, computed on demand
    pub fn stats(&self) -> AggregateStats {
        aggregate::summarize(&self.core.inner.read().visible)
    }

    /// Malformed records dropped from the last accepted batch
    pub fn rejected(&self) -> usize {
        self.core.inner.read().rejected
    }

    /// The error from the last failed fetch, if the session is in the
    /// error state
    pub fn last_error(&self) -> Option<SourceError> {
        self.core.inner.read().last_error.clone()
    }
}

impl<S> QuerySession<S> {
    /// Tear the session down: cancel the live timer and invalidate any
    /// in-flight fetch
    pub fn close(&self) {
        self.core.generation.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.core.inner.write();
        inner.live = false;
        if let Some(cancel) = inner.live_cancel.take() {
            cancel.cancel();
        }
    }
}

impl<S> Drop for QuerySession<S> {
    fn drop(&mut self) {
        self.close();
    }
}
