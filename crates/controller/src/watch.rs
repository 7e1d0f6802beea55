//! Pod watch loop and work queue.
//!
//! The watcher stream is turned into [`PodEvent`]s, filtered, and admitted
//! identities are pushed onto an in-process queue. Each dequeued identity is
//! reconciled on its own task, so two reconciles for the same pod can
//! overlap; the debounce store tolerates that.

use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ControllerConfig;
use crate::filter::{admit, PodEvent};
use crate::keys::PodKey;
use crate::reconcile::{ReconcileOutcome, Reconciler};

/// Converts raw watcher events into create/update/delete events.
///
/// Remembers the last resource version of every pod it has seen so a later
/// sighting can be told apart from a first one. A re-list that no longer
/// contains a known pod yields a delete for it.
#[derive(Debug, Default)]
pub struct EventTracker {
    versions: HashMap<PodKey, Option<String>>,
    relisted: Option<HashSet<PodKey>>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: Event<Pod>) -> Vec<PodEvent> {
        match event {
            Event::Init => {
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            Event::InitApply(pod) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(PodKey::from_pod(&pod));
                }
                vec![self.apply(pod)]
            }
            Event::InitDone => {
                let Some(relisted) = self.relisted.take() else {
                    return Vec::new();
                };
                let mut vanished: Vec<PodKey> = self
                    .versions
                    .keys()
                    .filter(|key| !relisted.contains(*key))
                    .cloned()
                    .collect();
                vanished.sort();
                for key in &vanished {
                    self.versions.remove(key);
                }
                vanished.into_iter().map(PodEvent::Delete).collect()
            }
            Event::Apply(pod) => vec![self.apply(pod)],
            Event::Delete(pod) => {
                let key = PodKey::from_pod(&pod);
                self.versions.remove(&key);
                vec![PodEvent::Delete(key)]
            }
        }
    }

    pub fn tracked(&self) -> usize {
        self.versions.len()
    }

    fn apply(&mut self, pod: Pod) -> PodEvent {
        let key = PodKey::from_pod(&pod);
        match self.versions.insert(key, pod.resource_version()) {
            None => PodEvent::Create(pod),
            Some(previous_version) => PodEvent::Update {
                previous_version,
                pod,
            },
        }
    }
}

/// Handle for scheduling reconciles.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<PodKey>,
}

impl WorkQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PodKey>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, key: PodKey) {
        if self.tx.send(key).is_err() {
            debug!("Work queue closed, dropping key");
        }
    }

    /// Enqueue `key` once after `delay`.
    pub fn enqueue_after(&self, key: PodKey, delay: Duration) {
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.enqueue(key);
        });
    }
}

/// Run the watch loop until the watch stream ends.
#[instrument(skip_all, fields(namespace = config.namespace.as_deref().unwrap_or("*")))]
pub async fn run_pod_watcher(
    client: Client,
    config: Arc<ControllerConfig>,
    reconciler: Arc<Reconciler>,
    ready: Arc<AtomicBool>,
) {
    info!("Starting pod watcher");

    let pods: Api<Pod> = match config.namespace.as_deref() {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    };

    let (queue, rx) = WorkQueue::new();
    let workers = tokio::spawn(run_workers(
        rx,
        queue.clone(),
        Arc::clone(&reconciler),
        config.error_requeue(),
    ));
    let sweeper = tokio::spawn(run_sweeper(Arc::clone(&reconciler), config.sweep_interval()));

    let mut tracker = EventTracker::new();
    let mut events = pin!(watcher(pods, watcher::Config::default()).default_backoff());

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Pod watch error, backing off");
                continue;
            }
        };

        if matches!(event, Event::InitDone) && !ready.swap(true, Ordering::SeqCst) {
            info!(pods = tracker.tracked(), "Initial pod list complete");
        }

        for pod_event in tracker.observe(event) {
            if admit(&pod_event) {
                let key = pod_event.key();
                debug!(pod = %key, event = pod_event.kind(), "Event admitted");
                queue.enqueue(key);
            }
        }
    }

    warn!("Pod watch stream ended");
    sweeper.abort();
    workers.abort();
}

async fn run_workers(
    mut rx: mpsc::UnboundedReceiver<PodKey>,
    queue: WorkQueue,
    reconciler: Arc<Reconciler>,
    error_requeue: Duration,
) {
    while let Some(key) = rx.recv().await {
        let queue = queue.clone();
        let reconciler = Arc::clone(&reconciler);
        tokio::spawn(async move {
            match reconciler.reconcile(&key).await {
                Ok(ReconcileOutcome::RetryScheduled { after, .. }) => {
                    queue.enqueue_after(key, after);
                }
                Ok(outcome) => {
                    debug!(pod = %key, outcome = ?outcome, "Reconcile finished");
                }
                Err(e) => {
                    error!(pod = %key, error = %e, "Reconcile failed, requeueing");
                    queue.enqueue_after(key, error_requeue);
                }
            }
        });
    }
}

async fn run_sweeper(reconciler: Arc<Reconciler>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let swept = reconciler.debounce().sweep_expired();
        if swept > 0 {
            debug!(swept, remaining = reconciler.debounce().len(), "Swept expired debounce entries");
        }
    }
}
