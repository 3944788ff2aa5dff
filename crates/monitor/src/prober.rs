//! Endpoint prober.
//!
//! Issues one bounded-time GET per endpoint and classifies the outcome. A
//! probe never fails: every transport problem becomes a classified
//! [`ProbeResult`].

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use sitewatch_core::probe::{ProbeOutcome, ProbeResult};

const USER_AGENT: &str = concat!("sitewatch/", env!("CARGO_PKG_VERSION"));

/// Something that can probe an endpoint.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeResult;
}

/// HTTP prober backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeResult {
        let start = Instant::now();
        let result = tokio::time::timeout(timeout, self.client.get(endpoint).send()).await;
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(Ok(response)) => ProbeOutcome::Response {
                status_code: response.status().as_u16(),
            },
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::TimedOut,
            Ok(Err(e)) => ProbeOutcome::Failed {
                reason: describe(&e),
            },
            Err(_) => ProbeOutcome::TimedOut,
        };

        let result = ProbeResult::classify(endpoint, outcome, elapsed, timeout);
        tracing::debug!(
            endpoint,
            signal = %result.signal,
            elapsed_ms = result.elapsed_ms,
            detail = %result.detail,
            "Probe finished"
        );
        result
    }
}

/// Flatten a `reqwest` error and its sources into one line.
fn describe(error: &reqwest::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
