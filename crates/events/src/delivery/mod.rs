//! External delivery channels for degraded-endpoint alerts.
//!
//! Every channel implements [`AlertChannel`] so the dispatcher can treat
//! email and webhook delivery uniformly and tests can substitute fakes.

use async_trait::async_trait;

use sitewatch_core::alert::AlertMessage;
use sitewatch_core::channels::Channel;
use sitewatch_core::config::MonitorConfig;

pub mod email;
pub mod webhook;

use email::EmailError;
use webhook::WebhookError;

/// Error from any delivery channel.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

/// An outbound alert channel.
///
/// Settings are read from the cycle's configuration snapshot on every call,
/// so edits take effect at the next cycle boundary.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Which throttle slot and policy this channel uses.
    fn channel(&self) -> Channel;

    /// Attempt one bounded-time delivery.
    async fn deliver(
        &self,
        config: &MonitorConfig,
        alert: &AlertMessage,
    ) -> Result<(), DeliveryError>;
}
