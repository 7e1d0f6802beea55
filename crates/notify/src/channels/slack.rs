//! Slack incoming-webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alert::PodAlert;
use crate::channels::AlertDispatcher;
use crate::error::{DeliveryError, SetupError};

/// Environment variable for the Slack webhook URL.
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Deadline for a single webhook POST.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack webhook notification channel.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook_url: Url,
    client: reqwest::Client,
}

impl SlackNotifier {
    /// Create a notifier from `SLACK_WEBHOOK_URL`.
    pub fn from_env() -> Result<Self, SetupError> {
        let webhook_url = std::env::var(ENV_SLACK_WEBHOOK_URL).unwrap_or_default();
        Self::new(&webhook_url)
    }

    /// Create a notifier for a specific webhook URL.
    pub fn new(webhook_url: &str) -> Result<Self, SetupError> {
        Self::with_timeout(webhook_url, DISPATCH_TIMEOUT)
    }

    /// Create a notifier with a non-default request deadline.
    pub fn with_timeout(webhook_url: &str, timeout: Duration) -> Result<Self, SetupError> {
        let webhook_url = webhook_url.trim();
        if webhook_url.is_empty() {
            return Err(SetupError::MissingWebhookUrl);
        }

        let parsed = Url::parse(webhook_url).map_err(|e| SetupError::InvalidWebhookUrl {
            url: webhook_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(host = parsed.host_str().unwrap_or_default(), "Slack notifier configured");

        Ok(Self {
            webhook_url: parsed,
            client,
        })
    }

    /// Wrap the rendered message in the webhook payload.
    fn format_payload(message: &str) -> SlackPayload<'_> {
        SlackPayload {
            text: message,
            blocks: vec![SlackBlock {
                kind: "section",
                text: SlackText {
                    kind: "mrkdwn",
                    text: message,
                },
            }],
        }
    }
}

#[async_trait]
impl AlertDispatcher for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn dispatch(&self, alert: &PodAlert) -> Result<(), DeliveryError> {
        let message = alert.format_message();
        let body = serde_json::to_vec(&Self::format_payload(&message))?;

        debug!(channel = "slack", pod = %alert.pod_name, reason = %alert.reason, "Sending alert");

        let response = self
            .client
            .post(self.webhook_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                pod = %alert.pod_name,
                namespace = %alert.namespace,
                reason = %alert.reason,
                restarts = alert.restart_count,
                "Slack alert sent"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            channel = "slack",
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );

        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
    blocks: Vec<SlackBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct SlackBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: SlackText<'a>,
}

#[derive(Debug, Serialize)]
struct SlackText<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}
