//! Aggregate alert composition for degraded endpoints.

use serde::Serialize;

use crate::probe::ProbeResult;
use crate::types::{format_timestamp, Timestamp};

/// Subject line used for every aggregate alert.
pub const ALERT_SUBJECT: &str = "Site Monitor Alert";

/// First line of the aggregate alert body.
const ALERT_HEADING: &str = "Problems with:";

/// One entry of a cycle's degraded-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedEndpoint {
    pub endpoint: String,
    pub detail: String,
}

impl From<&ProbeResult> for DegradedEndpoint {
    fn from(result: &ProbeResult) -> Self {
        Self {
            endpoint: result.endpoint.clone(),
            detail: result.detail.clone(),
        }
    }
}

/// A composed alert, ready for any channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub timestamp: Timestamp,
}

impl AlertMessage {
    /// Build the aggregate message, listing endpoints in the given order.
    ///
    /// Returns `None` when nothing is degraded.
    pub fn compose(degraded: &[DegradedEndpoint], timestamp: Timestamp) -> Option<Self> {
        if degraded.is_empty() {
            return None;
        }

        let mut body = String::from(ALERT_HEADING);
        for entry in degraded {
            body.push('\n');
            body.push_str(&entry.endpoint);
            body.push_str(": ");
            body.push_str(&entry.detail);
        }

        Some(Self {
            subject: ALERT_SUBJECT.to_string(),
            body,
            timestamp,
        })
    }

    /// Plain-text rendering used for the email body.
    pub fn email_body(&self) -> String {
        format!("{}\n\nChecked at: {} UTC", self.body, format_timestamp(&self.timestamp))
    }
}
