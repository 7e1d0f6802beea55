//! Error types for alert delivery.

use thiserror::Error;

/// Errors raised while delivering a single alert.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport failure, including the request deadline expiring
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-2xx status
    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeliveryError {
    /// Whether the request was abandoned because the dispatch deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// HTTP status code, when the endpoint answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) => None,
        }
    }
}

/// Errors raised while constructing a dispatcher at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No webhook URL was supplied
    #[error("Webhook URL not configured (set SLACK_WEBHOOK_URL)")]
    MissingWebhookUrl,

    /// Webhook URL could not be parsed
    #[error("Invalid webhook URL '{url}': {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
