//! Event filter applied before any reconcile is scheduled.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::classifier::classify;
use crate::keys::PodKey;

/// Pod lifecycle notification.
#[derive(Debug, Clone)]
pub enum PodEvent {
    /// First sighting of a pod
    Create(Pod),
    /// Later sighting; carries the resource version seen before this one
    Update {
        previous_version: Option<String>,
        pod: Pod,
    },
    /// Pod is gone
    Delete(PodKey),
    /// Out-of-band trigger carrying only an identity
    Generic(PodKey),
}

impl PodEvent {
    pub fn key(&self) -> PodKey {
        match self {
            Self::Create(pod) | Self::Update { pod, .. } => PodKey::from_pod(pod),
            Self::Delete(key) | Self::Generic(key) => key.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
            Self::Generic(_) => "generic",
        }
    }
}

/// Whether a reconcile should run for this event.
pub fn admit(event: &PodEvent) -> bool {
    match event {
        PodEvent::Create(pod) => admit_create(pod),
        PodEvent::Update {
            previous_version,
            pod,
        } => admit_update(previous_version.as_deref(), pod),
        PodEvent::Delete(_) => admit_delete(),
        PodEvent::Generic(_) => admit_generic(),
    }
}

/// Pods that start out already failing.
pub fn admit_create(pod: &Pod) -> bool {
    classify(pod).is_alert_worthy()
}

/// Changed pods whose new state is failing. An unchanged resource version is
/// a resync, not a change.
pub fn admit_update(previous_version: Option<&str>, pod: &Pod) -> bool {
    if previous_version.is_some() && previous_version == pod.resource_version().as_deref() {
        return false;
    }
    classify(pod).is_alert_worthy()
}

/// Deletes always run so the debounce entries get cleaned up.
pub fn admit_delete() -> bool {
    true
}

pub fn admit_generic() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(resource_version: &str, waiting_reason: Option<&str>) -> Pod {
        let state = match waiting_reason {
            Some(reason) => json!({ "waiting": { "reason": reason } }),
            None => json!({ "running": {} }),
        };
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "p1", "namespace": "ns", "resourceVersion": resource_version },
            "status": {
                "phase": "Running",
                "containerStatuses": [{
                    "name": "app", "image": "nginx", "imageID": "", "ready": false,
                    "restartCount": 2, "state": state
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_create_admits_failing_pod() {
        assert!(admit(&PodEvent::Create(pod("1", Some("CrashLoopBackOff")))));
    }

    #[test]
    fn test_create_rejects_healthy_pod() {
        assert!(!admit(&PodEvent::Create(pod("1", None))));
    }

    #[test]
    fn test_update_admits_changed_failing_pod() {
        let event = PodEvent::Update {
            previous_version: Some("1".to_string()),
            pod: pod("2", Some("ImagePullBackOff")),
        };
        assert!(admit(&event));
    }

    #[test]
    fn test_update_rejects_unchanged_resource_version() {
        let event = PodEvent::Update {
            previous_version: Some("7".to_string()),
            pod: pod("7", Some("CrashLoopBackOff")),
        };
        assert!(!admit(&event));
    }

    #[test]
    fn test_update_rejects_healthy_pod() {
        let event = PodEvent::Update {
            previous_version: Some("1".to_string()),
            pod: pod("2", None),
        };
        assert!(!admit(&event));
    }

    #[test]
    fn test_delete_always_admitted() {
        assert!(admit(&PodEvent::Delete(PodKey::new("ns", "p1"))));
    }

    #[test]
    fn test_generic_never_admitted() {
        assert!(!admit(&PodEvent::Generic(PodKey::new("ns", "p1"))));
    }

    #[test]
    fn test_event_key() {
        let event = PodEvent::Create(pod("1", None));
        assert_eq!(event.key(), PodKey::new("ns", "p1"));
        assert_eq!(event.kind(), "create");
    }
}
