//! In-flight call tracking.
//!
//! Replaces a single shared "loading" boolean with a counter so overlapping
//! calls are accounted for. Each call holds an [`InFlightGuard`]; the loading
//! state is true while at least one guard is alive. Watchers see `true` on the
//! 0 -> 1 transition and `false` on 1 -> 0.
//!
//! Trackers add to a shared gauge (the global `wos_in_flight` by default), so
//! several clients in one process report their combined count.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use wos_telemetry::{IntGauge, Metrics};

struct Inner {
    count: Mutex<usize>,
    state_tx: watch::Sender<bool>,
    gauge: IntGauge,
}

/// Shared in-flight counter. Cloning shares the same counter.
#[derive(Clone)]
pub struct LoadingTracker {
    inner: Arc<Inner>,
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoadingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingTracker")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::with_gauge(Metrics::in_flight_gauge())
    }

    /// Tracker reporting into `gauge` instead of the global one.
    pub fn with_gauge(gauge: IntGauge) -> Self {
        let (state_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                state_tx,
                gauge,
            }),
        }
    }

    /// Mark a call as started. The call ends when the guard is dropped.
    #[must_use = "the call is marked finished as soon as the guard is dropped"]
    pub fn begin(&self) -> InFlightGuard {
        let mut count = self.inner.count.lock();
        *count += 1;
        if *count == 1 {
            self.inner.state_tx.send_replace(true);
        }
        self.inner.gauge.inc();
        InFlightGuard {
            tracker: self.clone(),
        }
    }

    fn end(&self) {
        let mut count = self.inner.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.inner.state_tx.send_replace(false);
        }
        self.inner.gauge.dec();
    }

    /// Calls currently in flight.
    pub fn in_flight(&self) -> usize {
        *self.inner.count.lock()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    /// Watch the loading state.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.state_tx.subscribe()
    }
}

/// Marks one call as in flight until dropped.
pub struct InFlightGuard {
    tracker: LoadingTracker,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.end();
    }
}
