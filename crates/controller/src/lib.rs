/*
 * 5D Labs Platform - Pod Failure Alerting
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Pod failure watcher.
//!
//! Watches pods, classifies failures worth a human's attention, suppresses
//! repeats per (pod, reason) for a debounce window and posts the rest to a
//! Slack webhook.

pub mod alert;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod keys;
pub mod reconcile;
pub mod server;
pub mod watch;

// Re-export commonly used types
pub use classifier::{classify, Classification, Failure, FailureSource};
pub use config::{Cli, ControllerConfig, LogFormat};
pub use debounce::DebounceStore;
pub use error::{Error, Result};
pub use filter::{admit, PodEvent};
pub use keys::{AlertKey, PodKey};
pub use reconcile::{ApiPodSource, PodSource, ReconcileOutcome, Reconciler};
