//! Failure classification.
//!
//! Maps an observed pod to a verdict: either healthy, or alert-worthy with a
//! short reason code. Rules are evaluated in priority order and the first
//! match wins:
//!
//! 1. Pod phase `Failed` → reason `Failed`
//! 2. First container waiting with a crash or image-pull reason
//! 3. First container terminated with a non-zero exit and a failure reason
//! 4. First init container waiting with a crash or image-pull reason,
//!    reported as `InitContainer-<reason>`
//! 5. `PodScheduled=False` with reason `Unschedulable` → `FailedScheduling`
//!
//! Classification is total and side-effect free.

use k8s_openapi::api::core::v1::{ContainerStatus, Pod, PodStatus};

/// Waiting reasons that make a regular container alert-worthy.
pub const CONTAINER_WAITING_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "InvalidImageName",
    "ImageInspectError",
];

/// Terminated reasons that make a regular container alert-worthy.
pub const CONTAINER_TERMINATED_REASONS: &[&str] =
    &["OOMKilled", "Error", "ContainerCannotRun", "DeadlineExceeded"];

/// Waiting reasons that make an init container alert-worthy.
pub const INIT_CONTAINER_WAITING_REASONS: &[&str] =
    &["CrashLoopBackOff", "ImagePullBackOff", "ErrImagePull"];

pub const PHASE_FAILED: &str = "Failed";
pub const REASON_FAILED_SCHEDULING: &str = "FailedScheduling";
pub const INIT_CONTAINER_PREFIX: &str = "InitContainer-";

/// Which rule produced a failure verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    /// Pod phase is `Failed`
    Phase,
    /// Index into `status.containerStatuses`
    Container(usize),
    /// Index into `status.initContainerStatuses`
    InitContainer(usize),
    /// `PodScheduled` condition reports `Unschedulable`
    Scheduling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub reason: String,
    pub source: FailureSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Healthy,
    AlertWorthy(Failure),
}

impl Classification {
    pub fn is_alert_worthy(&self) -> bool {
        matches!(self, Self::AlertWorthy(_))
    }

    /// Reason code, or `""` for a healthy pod.
    pub fn reason(&self) -> &str {
        match self {
            Self::Healthy => "",
            Self::AlertWorthy(failure) => &failure.reason,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Healthy => None,
            Self::AlertWorthy(failure) => Some(failure),
        }
    }
}

/// Classify a pod snapshot.
pub fn classify(pod: &Pod) -> Classification {
    let Some(status) = pod.status.as_ref() else {
        return Classification::Healthy;
    };

    phase_failure(status)
        .or_else(|| container_waiting_failure(status))
        .or_else(|| container_terminated_failure(status))
        .or_else(|| init_container_failure(status))
        .or_else(|| scheduling_failure(status))
        .map_or(Classification::Healthy, Classification::AlertWorthy)
}

fn phase_failure(status: &PodStatus) -> Option<Failure> {
    (status.phase.as_deref() == Some(PHASE_FAILED)).then(|| Failure {
        reason: PHASE_FAILED.to_string(),
        source: FailureSource::Phase,
    })
}

fn container_waiting_failure(status: &PodStatus) -> Option<Failure> {
    container_statuses(status)
        .iter()
        .enumerate()
        .find_map(|(index, cs)| {
            waiting_reason(cs)
                .filter(|reason| CONTAINER_WAITING_REASONS.contains(reason))
                .map(|reason| Failure {
                    reason: reason.to_string(),
                    source: FailureSource::Container(index),
                })
        })
}

fn container_terminated_failure(status: &PodStatus) -> Option<Failure> {
    container_statuses(status)
        .iter()
        .enumerate()
        .find_map(|(index, cs)| {
            let terminated = cs.state.as_ref()?.terminated.as_ref()?;
            if terminated.exit_code == 0 {
                return None;
            }
            let reason = terminated.reason.as_deref()?;
            CONTAINER_TERMINATED_REASONS
                .contains(&reason)
                .then(|| Failure {
                    reason: reason.to_string(),
                    source: FailureSource::Container(index),
                })
        })
}

fn init_container_failure(status: &PodStatus) -> Option<Failure> {
    status
        .init_container_statuses
        .as_deref()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .find_map(|(index, cs)| {
            waiting_reason(cs)
                .filter(|reason| INIT_CONTAINER_WAITING_REASONS.contains(reason))
                .map(|reason| Failure {
                    reason: format!("{INIT_CONTAINER_PREFIX}{reason}"),
                    source: FailureSource::InitContainer(index),
                })
        })
}

fn scheduling_failure(status: &PodStatus) -> Option<Failure> {
    status
        .conditions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|c| {
            c.type_ == "PodScheduled"
                && c.status == "False"
                && c.reason.as_deref() == Some("Unschedulable")
        })
        .then(|| Failure {
            reason: REASON_FAILED_SCHEDULING.to_string(),
            source: FailureSource::Scheduling,
        })
}

pub(crate) fn container_statuses(status: &PodStatus) -> &[ContainerStatus] {
    status.container_statuses.as_deref().unwrap_or_default()
}

pub(crate) fn waiting_reason(cs: &ContainerStatus) -> Option<&str> {
    cs.state.as_ref()?.waiting.as_ref()?.reason.as_deref()
}
