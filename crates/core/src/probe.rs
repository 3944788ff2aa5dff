//! Probe result types and the classification policy.
//!
//! A probe produces exactly one [`ProbeResult`] per endpoint per cycle. The
//! result carries both the health class ([`ProbeStatus`]) and the outward
//! indicator colour ([`Signal`]) because a timeout and a generic transport
//! failure share a class but are shown differently.

use std::time::Duration;

use serde::Serialize;

/// Detail text recorded for a successful probe.
pub const DETAIL_OK: &str = "OK";

/// Detail text recorded when the probe hit its timeout.
pub const DETAIL_TIMEOUT: &str = "TIMEOUT";

// ---------------------------------------------------------------------------
// Status / signal
// ---------------------------------------------------------------------------

/// Health class of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// The endpoint answered HTTP 200.
    Healthy,
    /// The endpoint answered with any other status code.
    Degraded,
    /// No response: timeout or transport failure.
    Unreachable,
}

/// Indicator colour reported to the presentation layer and written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Green,
    Yellow,
    Red,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Green => "green",
            Signal::Yellow => "yellow",
            Signal::Red => "red",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome → result
// ---------------------------------------------------------------------------

/// What the transport observed, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A complete HTTP response was received.
    Response { status_code: u16 },
    /// The request did not finish within the probe timeout.
    TimedOut,
    /// Any other transport failure (DNS, refused, TLS, ...).
    Failed { reason: String },
}

/// The classified result of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub endpoint: String,
    pub status: ProbeStatus,
    pub signal: Signal,
    pub elapsed_ms: u64,
    pub detail: String,
}

impl ProbeResult {
    /// Classify a transport outcome.
    ///
    /// `elapsed` is the measured wall-clock time; it is ignored for
    /// timeouts, which always record exactly the configured bound.
    pub fn classify(
        endpoint: impl Into<String>,
        outcome: ProbeOutcome,
        elapsed: Duration,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        let measured_ms = elapsed.as_millis() as u64;

        let (status, signal, elapsed_ms, detail) = match outcome {
            ProbeOutcome::Response { status_code: 200 } => (
                ProbeStatus::Healthy,
                Signal::Green,
                measured_ms,
                DETAIL_OK.to_string(),
            ),
            ProbeOutcome::Response { status_code } => (
                ProbeStatus::Degraded,
                Signal::Red,
                measured_ms,
                format!("HTTP {status_code}"),
            ),
            ProbeOutcome::TimedOut => (
                ProbeStatus::Unreachable,
                Signal::Yellow,
                timeout.as_millis() as u64,
                DETAIL_TIMEOUT.to_string(),
            ),
            ProbeOutcome::Failed { reason } => {
                (ProbeStatus::Unreachable, Signal::Red, measured_ms, reason)
            }
        };

        Self {
            endpoint,
            status,
            signal,
            elapsed_ms,
            detail,
        }
    }

    /// Whether this result belongs in the cycle's degraded-set.
    pub fn is_degraded(&self) -> bool {
        self.status != ProbeStatus::Healthy
    }
}
