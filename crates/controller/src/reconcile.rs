//! Reconciliation of a single pod identity.
//!
//! One run walks `Fetch → Classify → DebounceCheck → Dispatch → Record`:
//!
//! - pod gone: evict its debounce entries and stop
//! - pod healthy: stop
//! - (pod, reason) alerted within the window: stop
//! - dispatch succeeded: record the alert and stop
//! - dispatch failed: do not record, ask for one retry after `retry_delay`
//!
//! Nothing is carried between runs except the debounce store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use podsentry_notify::AlertDispatcher;
use tracing::{debug, error, info, instrument};

use crate::alert::build_alert;
use crate::classifier::{classify, Classification};
use crate::clock::{Clock, SystemClock};
use crate::debounce::DebounceStore;
use crate::error::Result;
use crate::keys::{AlertKey, PodKey};

/// Default delay before retrying a failed dispatch.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Read access to current pod state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodSource: Send + Sync {
    /// Current snapshot, or `None` when the pod no longer exists.
    async fn get(&self, key: &PodKey) -> Result<Option<Pod>>;
}

/// Fetches pods straight from the API server.
#[derive(Clone)]
pub struct ApiPodSource {
    client: Client,
}

impl ApiPodSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodSource for ApiPodSource {
    async fn get(&self, key: &PodKey) -> Result<Option<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(pods.get_opt(&key.name).await?)
    }
}

/// How a reconcile run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Pod no longer exists; its debounce entries were dropped
    CleanedUp { evicted: usize },
    /// Pod is not alert-worthy
    Healthy,
    /// Alert for this reason already sent within the window
    Suppressed { reason: String },
    /// Alert delivered and recorded
    Alerted { reason: String },
    /// Delivery failed; the identity should be reconciled again after `after`
    RetryScheduled { reason: String, after: Duration },
}

pub struct Reconciler {
    pods: Arc<dyn PodSource>,
    dispatcher: Arc<dyn AlertDispatcher>,
    debounce: Arc<DebounceStore>,
    clock: Arc<dyn Clock>,
    retry_delay: Duration,
}

impl Reconciler {
    pub fn new(
        pods: Arc<dyn PodSource>,
        dispatcher: Arc<dyn AlertDispatcher>,
        debounce: Arc<DebounceStore>,
    ) -> Self {
        Self {
            pods,
            dispatcher,
            debounce,
            clock: Arc::new(SystemClock),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn debounce(&self) -> &Arc<DebounceStore> {
        &self.debounce
    }

    /// Run one reconcile for `key`.
    ///
    /// Only fetch failures are returned as errors. Delivery failures become
    /// [`ReconcileOutcome::RetryScheduled`].
    #[instrument(skip(self), fields(namespace = %key.namespace, pod = %key.name))]
    pub async fn reconcile(&self, key: &PodKey) -> Result<ReconcileOutcome> {
        let Some(pod) = self.pods.get(key).await? else {
            let evicted = self.debounce.evict_all(key);
            debug!(evicted, "Pod gone, cleaned up debounce entries");
            return Ok(ReconcileOutcome::CleanedUp { evicted });
        };

        let Classification::AlertWorthy(failure) = classify(&pod) else {
            return Ok(ReconcileOutcome::Healthy);
        };

        let alert_key = AlertKey::new(key.clone(), failure.reason.clone());
        if self.debounce.is_suppressed(&alert_key) {
            debug!(reason = %failure.reason, "Skipping alert due to debouncing");
            return Ok(ReconcileOutcome::Suppressed {
                reason: failure.reason,
            });
        }

        let alert = build_alert(&pod, &failure, self.clock.now());

        match self.dispatcher.dispatch(&alert).await {
            Ok(()) => {
                self.debounce.record(alert_key);
                info!(
                    reason = %alert.reason,
                    restarts = alert.restart_count,
                    channel = self.dispatcher.name(),
                    "Sent pod failure alert"
                );
                Ok(ReconcileOutcome::Alerted {
                    reason: failure.reason,
                })
            }
            Err(e) => {
                error!(
                    error = %e,
                    reason = %alert.reason,
                    timeout = e.is_timeout(),
                    retry_in_secs = self.retry_delay.as_secs(),
                    "Failed to send alert"
                );
                Ok(ReconcileOutcome::RetryScheduled {
                    reason: failure.reason,
                    after: self.retry_delay,
                })
            }
        }
    }
}
