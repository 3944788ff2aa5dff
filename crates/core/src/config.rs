//! Monitor configuration snapshot, defaults, normalisation and validation.
//!
//! A [`MonitorConfig`] is read once at the start of every cycle and never
//! mutated while the cycle runs. The settings file accepts both the current
//! field names and the legacy ones written by older settings dialogs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Endpoint probed when no settings exist yet.
pub const DEFAULT_ENDPOINT: &str = "https://example.com";

/// Seconds between the end of one cycle and the start of the next.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 20;

/// Per-probe timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Availability log destination.
pub const DEFAULT_LOG_PATH: &str = "site_availability.csv";

/// Minimum spacing between alert emails in seconds.
pub const DEFAULT_EMAIL_MIN_INTERVAL_SECS: u64 = 3600;

/// SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

// ---------------------------------------------------------------------------
// Channel policy
// ---------------------------------------------------------------------------

/// Throttle-relevant view of a channel's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub enabled: bool,
    pub min_interval: Duration,
}

/// How degraded endpoints are surfaced to the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationMode {
    /// One warning per degraded endpoint, emitted as soon as it is probed.
    Individual,
    /// One aggregate warning per cycle, emitted after dispatch.
    Aggregate,
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// SMTP alert channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EmailSettingsFile")]
pub struct EmailSettings {
    pub enabled: bool,
    pub min_interval_secs: u64,
    /// Drives the UI escalation mode only; outbound channels always receive
    /// the aggregate alert.
    pub escalate_individually: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from_address: String,
    pub to_addresses: Vec<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_interval_secs: DEFAULT_EMAIL_MIN_INTERVAL_SECS,
            escalate_individually: false,
            smtp_host: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_address: String::new(),
            to_addresses: Vec::new(),
        }
    }
}

/// On-disk shape of [`EmailSettings`], accepting legacy names.
#[derive(Deserialize)]
#[serde(default)]
struct EmailSettingsFile {
    enabled: bool,
    #[serde(alias = "interval")]
    min_interval_secs: u64,
    escalate_individually: Option<bool>,
    /// Legacy inverse of `escalate_individually`.
    only_on_danger: Option<bool>,
    #[serde(alias = "smtp_server")]
    smtp_host: String,
    smtp_port: u16,
    smtp_user: String,
    #[serde(alias = "smtp_pass")]
    smtp_password: String,
    #[serde(alias = "from_addr")]
    from_address: String,
    #[serde(alias = "to_addrs")]
    to_addresses: Vec<String>,
}

impl Default for EmailSettingsFile {
    fn default() -> Self {
        let d = EmailSettings::default();
        Self {
            enabled: d.enabled,
            min_interval_secs: d.min_interval_secs,
            escalate_individually: None,
            only_on_danger: None,
            smtp_host: d.smtp_host,
            smtp_port: d.smtp_port,
            smtp_user: d.smtp_user,
            smtp_password: d.smtp_password,
            from_address: d.from_address,
            to_addresses: d.to_addresses,
        }
    }
}

impl From<EmailSettingsFile> for EmailSettings {
    fn from(f: EmailSettingsFile) -> Self {
        let escalate_individually = f
            .escalate_individually
            .or(f.only_on_danger.map(|only| !only))
            .unwrap_or(false);
        Self {
            enabled: f.enabled,
            min_interval_secs: f.min_interval_secs,
            escalate_individually,
            smtp_host: f.smtp_host,
            smtp_port: f.smtp_port,
            smtp_user: f.smtp_user,
            smtp_password: f.smtp_password,
            from_address: f.from_address,
            to_addresses: f.to_addresses,
        }
    }
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// Chat webhook alert channel settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub enabled: bool,
    #[serde(alias = "webhook_url")]
    pub url: String,
    /// `0` leaves the webhook unthrottled.
    pub min_interval_secs: u64,
}

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Immutable configuration snapshot consumed by one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(alias = "sites")]
    pub endpoints: Vec<String>,
    #[serde(alias = "check_interval")]
    pub check_interval_secs: u64,
    #[serde(alias = "request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(alias = "csv_log_file")]
    pub log_path: PathBuf,
    #[serde(alias = "email_notifications")]
    pub email: EmailSettings,
    #[serde(alias = "slack_notifications")]
    pub webhook: WebhookSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            email: EmailSettings::default(),
            webhook: WebhookSettings::default(),
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Trim endpoints, drop blanks, and remove duplicates keeping the first
    /// occurrence so iteration order stays the configured order.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.endpoints = self
            .endpoints
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .filter(|e| seen.insert(e.clone()))
            .collect();
        self.email.to_addresses = self
            .email
            .to_addresses
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self.webhook.url = self.webhook.url.trim().to_string();
        self
    }

    /// Reject settings the scheduler cannot run with.
    ///
    /// An empty endpoint list is valid and yields zero-iteration cycles.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.check_interval_secs == 0 {
            return Err(CoreError::Validation(
                "check interval must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Validation(
                "request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(CoreError::Validation(
                "log path must not be empty".to_string(),
            ));
        }
        if self.email.enabled {
            if self.email.smtp_host.trim().is_empty() {
                return Err(CoreError::Validation(
                    "email notifications require an SMTP host".to_string(),
                ));
            }
            if self.email.from_address.trim().is_empty() {
                return Err(CoreError::Validation(
                    "email notifications require a sender address".to_string(),
                ));
            }
            if self.email.to_addresses.is_empty() {
                return Err(CoreError::Validation(
                    "email notifications require at least one recipient".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Throttle policy for a channel under this snapshot.
    ///
    /// A webhook without a URL counts as disabled.
    pub fn channel_policy(&self, channel: Channel) -> ChannelPolicy {
        match channel {
            Channel::Email => ChannelPolicy {
                enabled: self.email.enabled,
                min_interval: Duration::from_secs(self.email.min_interval_secs),
            },
            Channel::Webhook => ChannelPolicy {
                enabled: self.webhook.enabled && !self.webhook.url.is_empty(),
                min_interval: Duration::from_secs(self.webhook.min_interval_secs),
            },
        }
    }

    pub fn escalation_mode(&self) -> EscalationMode {
        if self.email.escalate_individually {
            EscalationMode::Individual
        } else {
            EscalationMode::Aggregate
        }
    }
}
