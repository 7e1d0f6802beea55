//! Build a [`PodAlert`] from a pod snapshot and its classification.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod, PodStatus};
use podsentry_notify::PodAlert;

use crate::classifier::{container_statuses, Failure, FailureSource};
use crate::keys::PodKey;

/// Container details that go into an alert.
#[derive(Debug, Default)]
struct ContainerDetails {
    name: String,
    image: String,
    message: String,
    restart_count: i32,
}

impl ContainerDetails {
    fn from_status(cs: &ContainerStatus) -> Self {
        let state = cs.state.as_ref();
        let message = state
            .and_then(|s| {
                s.waiting
                    .as_ref()
                    .and_then(|w| w.message.clone())
                    .or_else(|| s.terminated.as_ref().and_then(|t| t.message.clone()))
            })
            .unwrap_or_default();

        Self {
            name: cs.name.clone(),
            image: cs.image.clone(),
            message,
            restart_count: cs.restart_count,
        }
    }

    /// First container of the pod spec, with a pod-level message.
    fn from_spec(pod: &Pod, message: String) -> Self {
        let container = pod.spec.as_ref().and_then(|spec| spec.containers.first());
        Self {
            name: container.map(|c| c.name.clone()).unwrap_or_default(),
            image: container.and_then(|c| c.image.clone()).unwrap_or_default(),
            message,
            restart_count: 0,
        }
    }
}

/// Assemble the alert for `failure`. The reason always comes from the
/// classifier so it matches the debounce key.
pub fn build_alert(pod: &Pod, failure: &Failure, now: DateTime<Utc>) -> PodAlert {
    let key = PodKey::from_pod(pod);
    let status = pod.status.as_ref();
    let pod_message = status.and_then(|s| s.message.clone()).unwrap_or_default();

    let details = match failure.source {
        FailureSource::Container(index) => status
            .and_then(|s| container_statuses(s).get(index))
            .map(ContainerDetails::from_status),
        FailureSource::InitContainer(index) => status
            .and_then(|s| s.init_container_statuses.as_ref()?.get(index))
            .map(ContainerDetails::from_status),
        FailureSource::Phase => status.and_then(first_troubled_container),
        FailureSource::Scheduling => {
            let message = status
                .and_then(scheduling_message)
                .unwrap_or_else(|| pod_message.clone());
            Some(ContainerDetails::from_spec(pod, message))
        }
    }
    .unwrap_or_else(|| ContainerDetails::from_spec(pod, pod_message));

    PodAlert {
        pod_name: key.name,
        namespace: key.namespace,
        container_name: details.name,
        image: details.image,
        reason: failure.reason.clone(),
        message: details.message,
        restart_count: details.restart_count,
        timestamp: now,
    }
}

/// First container that is waiting or exited non-zero, then the first
/// waiting init container.
fn first_troubled_container(status: &PodStatus) -> Option<ContainerDetails> {
    container_statuses(status)
        .iter()
        .find(|cs| {
            cs.state.as_ref().is_some_and(|s| {
                s.waiting.is_some() || s.terminated.as_ref().is_some_and(|t| t.exit_code != 0)
            })
        })
        .or_else(|| {
            status
                .init_container_statuses
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find(|cs| cs.state.as_ref().is_some_and(|s| s.waiting.is_some()))
        })
        .map(ContainerDetails::from_status)
}

fn scheduling_message(status: &PodStatus) -> Option<String> {
    status
        .conditions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|c| c.type_ == "PodScheduled")
        .and_then(|c| c.message.clone())
}
