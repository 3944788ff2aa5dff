//! Email alert delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send the
//! plain-text aggregate alert through a STARTTLS relay. Relay, credentials
//! and recipients come from the cycle's [`EmailSettings`].

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use sitewatch_core::alert::AlertMessage;
use sitewatch_core::channels::Channel;
use sitewatch_core::config::{EmailSettings, MonitorConfig};

use super::{AlertChannel, DeliveryError};

/// Upper bound for one SMTP conversation.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The relay did not finish the conversation in time.
    #[error("SMTP send timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends alert emails via SMTP.
#[derive(Debug, Clone)]
pub struct EmailDelivery {
    timeout: Duration,
}

impl Default for EmailDelivery {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailDelivery {
    pub fn new() -> Self {
        Self {
            timeout: SMTP_TIMEOUT,
        }
    }

    /// Send the alert to every configured recipient in one message.
    pub async fn send(
        &self,
        settings: &EmailSettings,
        alert: &AlertMessage,
    ) -> Result<(), EmailError> {
        let email = build_message(settings, alert)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
                .port(settings.smtp_port)
                .timeout(Some(self.timeout));

        if !settings.smtp_user.is_empty() {
            transport_builder = transport_builder.credentials(Credentials::new(
                settings.smtp_user.clone(),
                settings.smtp_password.clone(),
            ));
        }

        let mailer = transport_builder.build();
        tokio::time::timeout(self.timeout, mailer.send(email))
            .await
            .map_err(|_| EmailError::Timeout(self.timeout))??;

        tracing::info!(
            recipients = settings.to_addresses.len(),
            relay = %settings.smtp_host,
            "Alert email sent"
        );
        Ok(())
    }
}

/// Assemble the MIME message for an alert.
fn build_message(settings: &EmailSettings, alert: &AlertMessage) -> Result<Message, EmailError> {
    let from: Mailbox = settings.from_address.parse()?;
    let mut builder = Message::builder()
        .from(from)
        .subject(alert.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    for address in &settings.to_addresses {
        let to: Mailbox = address.parse()?;
        builder = builder.to(to);
    }

    builder
        .body(alert.email_body())
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl AlertChannel for EmailDelivery {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn deliver(
        &self,
        config: &MonitorConfig,
        alert: &AlertMessage,
    ) -> Result<(), DeliveryError> {
        Ok(self.send(&config.email, alert).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
