//! Identity types for pods and alerts.

use std::fmt;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// Namespace and name of a pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
}

impl PodKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a pod object. Cluster-scoped objects never reach us, so a
    /// missing namespace maps to `default` the way the API server does.
    pub fn from_pod(pod: &Pod) -> Self {
        Self::new(
            pod.namespace().unwrap_or_else(|| "default".to_string()),
            pod.name_any(),
        )
    }
}

impl fmt::Display for PodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Debounce identity: one pod plus one failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub pod: PodKey,
    pub reason: String,
}

impl AlertKey {
    pub fn new(pod: PodKey, reason: impl Into<String>) -> Self {
        Self {
            pod,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pod, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pod_key_from_pod() {
        let pod: Pod = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web-1", "namespace": "shop" }
        }))
        .unwrap();
        assert_eq!(PodKey::from_pod(&pod), PodKey::new("shop", "web-1"));
        assert_eq!(PodKey::from_pod(&pod).to_string(), "shop/web-1");
    }

    #[test]
    fn test_alert_keys_for_prefix_sharing_pods_differ() {
        let a = AlertKey::new(PodKey::new("ns", "web"), "1-OOMKilled");
        let b = AlertKey::new(PodKey::new("ns", "web-1"), "OOMKilled");
        // Same rendering, different identity.
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }
}
