//! Notification channel identifiers.
//!
//! Each channel is throttled independently; the string names are what the
//! log lines and dispatch reports use.

use serde::Serialize;

/// Email notification delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// Webhook notification delivered to an external chat endpoint.
pub const CHANNEL_WEBHOOK: &str = "webhook";

/// An outbound alert channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Webhook,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => CHANNEL_EMAIL,
            Channel::Webhook => CHANNEL_WEBHOOK,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
