//! Chat webhook alert delivery.
//!
//! [`WebhookDelivery`] POSTs `{"text": <alert body>}` to the configured URL.
//! There is a single attempt per cycle: on failure the throttle is left
//! untouched, so the next cycle retries.

use std::time::Duration;

use async_trait::async_trait;

use sitewatch_core::alert::AlertMessage;
use sitewatch_core::channels::Channel;
use sitewatch_core::config::MonitorConfig;

use super::{AlertChannel, DeliveryError};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers alerts to a chat webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
}

impl WebhookDelivery {
    /// Create a delivery service with a client bounded by the send timeout.
    pub fn new() -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// POST the alert text to `url`.
    pub async fn send(&self, url: &str, alert: &AlertMessage) -> Result<(), WebhookError> {
        let payload = serde_json::json!({ "text": alert.body });

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }

        tracing::info!(url, "Alert webhook delivered");
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for WebhookDelivery {
    fn channel(&self) -> Channel {
        Channel::Webhook
    }

    async fn deliver(
        &self,
        config: &MonitorConfig,
        alert: &AlertMessage,
    ) -> Result<(), DeliveryError> {
        Ok(self.send(&config.webhook.url, alert).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
