//! Controller error and result types.

use podsentry_notify::SetupError;
use thiserror::Error;

/// Errors surfaced by the controller.
///
/// Alert delivery failures are not represented here: the reconciler turns them
/// into a scheduled retry instead of an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notifier setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
