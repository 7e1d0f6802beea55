//! Alert delivery channels.

pub mod slack;

use async_trait::async_trait;

use crate::alert::PodAlert;
use crate::error::DeliveryError;

/// Delivers a formatted alert to an external endpoint.
///
/// One call is one delivery attempt; implementations must not retry
/// internally or keep state between calls.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Deliver a single alert.
    async fn dispatch(&self, alert: &PodAlert) -> Result<(), DeliveryError>;
}
