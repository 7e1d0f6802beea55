//! Pod failure alert and its human-readable rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Emoji used when a reason has no dedicated entry.
pub const DEFAULT_EMOJI: &str = "⚠️";

/// A single pod failure, built fresh for each dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodAlert {
    pub pod_name: String,
    pub namespace: String,
    pub container_name: String,
    pub image: String,
    /// Short reason code, e.g. `CrashLoopBackOff` or `FailedScheduling`
    pub reason: String,
    pub message: String,
    pub restart_count: i32,
    pub timestamp: DateTime<Utc>,
}

impl PodAlert {
    /// Render the multi-line message body.
    ///
    /// Output is a pure function of the alert fields, so identical alerts
    /// always render identically.
    #[must_use]
    pub fn format_message(&self) -> String {
        format!(
            "{emoji} *Pod Failure Alert:*\n\
             \n\
             *Pod:* {pod} (namespace: {namespace})\n\
             *Container:* {container}\n\
             *Image:* {image}\n\
             *Reason:* {reason}\n\
             *Message:* {message}\n\
             *Restarts:* {restarts}\n\
             *Time:* {time}",
            emoji = emoji_for_reason(&self.reason),
            pod = self.pod_name,
            namespace = self.namespace,
            container = self.container_name,
            image = self.image,
            reason = self.reason,
            message = self.message,
            restarts = self.restart_count,
            time = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}

/// Look up the emoji shown in front of an alert.
#[must_use]
pub fn emoji_for_reason(reason: &str) -> &'static str {
    match reason {
        "CrashLoopBackOff" => "🚨",
        "ImagePullBackOff" => "🔴",
        "ErrImagePull" => "📦",
        "OOMKilled" => "💥",
        "FailedScheduling" => "⏰",
        _ => DEFAULT_EMOJI,
    }
}
