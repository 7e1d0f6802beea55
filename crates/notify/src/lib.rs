//! Pod failure alert delivery.
//!
//! Turns a [`PodAlert`] into a human-readable message and posts it to a
//! Slack-compatible incoming webhook.
//!
//! # Usage
//!
//! ```no_run
//! use podsentry_notify::{AlertDispatcher, PodAlert, SlackNotifier};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = SlackNotifier::from_env()?;
//!
//! notifier
//!     .dispatch(&PodAlert {
//!         pod_name: "web-7d9c".to_string(),
//!         namespace: "shop".to_string(),
//!         container_name: "app".to_string(),
//!         image: "ghcr.io/acme/web:1.4.0".to_string(),
//!         reason: "CrashLoopBackOff".to_string(),
//!         message: "back-off 5m0s restarting failed container".to_string(),
//!         restart_count: 7,
//!         timestamp: chrono::Utc::now(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `SLACK_WEBHOOK_URL`: webhook endpoint. Required; a missing value is a
//!   [`SetupError`] at construction time, never a per-alert error.
//!
//! Every dispatch is exactly one POST bounded by [`DISPATCH_TIMEOUT`]. Retrying
//! is the caller's responsibility.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod channels;
pub mod error;

pub use alert::{emoji_for_reason, PodAlert};
pub use channels::slack::{SlackNotifier, DISPATCH_TIMEOUT, ENV_SLACK_WEBHOOK_URL};
pub use channels::AlertDispatcher;
pub use error::{DeliveryError, SetupError};
