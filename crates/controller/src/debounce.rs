//! Debounce store.
//!
//! Remembers when each (pod, reason) pair was last alerted so repeated
//! reconciles inside the window stay quiet. Entries are shared by every
//! concurrent reconcile; lookups take a shard read lock and never block each
//! other.
//!
//! Expiry is lazy: `is_suppressed` compares against the window on every
//! lookup. `sweep_expired` exists only to bound memory for pods whose reason
//! keeps changing without the pod ever being deleted.
//!
//! There is no atomic check-then-record. Two reconciles racing on the same
//! key can both pass `is_suppressed` and both dispatch; that duplicate is
//! accepted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::keys::{AlertKey, PodKey};

/// Default suppression window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10 * 60);

pub struct DebounceStore {
    entries: DashMap<AlertKey, DateTime<Utc>>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl DebounceStore {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True iff `key` was recorded less than one window ago.
    pub fn is_suppressed(&self, key: &AlertKey) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|last| self.within_window(*last, now))
    }

    /// Stamp `key` with the current time, replacing any previous entry.
    pub fn record(&self, key: AlertKey) {
        let now = self.clock.now();
        self.entries.insert(key, now);
    }

    /// Drop every entry belonging to `pod`. Returns how many were removed.
    pub fn evict_all(&self, pod: &PodKey) -> usize {
        let mut evicted = 0;
        self.entries.retain(|key, _| {
            let keep = key.pod != *pod;
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(pod = %pod, evicted, "Evicted debounce entries");
        }
        evicted
    }

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut swept = 0;
        self.entries.retain(|_, last| {
            let keep = self.within_window(*last, now);
            if !keep {
                swept += 1;
            }
            keep
        });
        swept
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn within_window(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // A clock that stepped backwards leaves the entry suppressed.
        (now - last).to_std().map_or(true, |elapsed| elapsed < self.window)
    }
}

impl Default for DebounceStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
