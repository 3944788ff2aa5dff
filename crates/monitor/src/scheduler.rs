//! The recurring poll cycle.
//!
//! [`Scheduler`] runs as a single background task. Every cycle it takes a
//! fresh configuration snapshot and one timestamp, probes each endpoint in
//! configured order, forwards each result to the availability log and the
//! UI bus, hands the degraded-set to the dispatcher once, then sleeps.
//!
//! ```text
//! Idle → Probing(1) → … → Probing(n) → Dispatching → Sleeping → Idle
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use sitewatch_core::alert::DegradedEndpoint;
use sitewatch_core::config::{EscalationMode, MonitorConfig};
use sitewatch_core::probe::ProbeResult;
use sitewatch_core::types::Timestamp;
use sitewatch_events::{DispatchReport, EventBus, NotificationDispatcher, WarningTarget};

use crate::availability_log::AvailabilityLog;
use crate::prober::Probe;
use crate::settings::ConfigProvider;

/// Everything one cycle produced.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// One result per probed endpoint, in configured order.
    pub results: Vec<ProbeResult>,
    /// Non-healthy endpoints, in configured order, without duplicates.
    pub degraded: Vec<DegradedEndpoint>,
    /// Present when the degraded-set was handed to the dispatcher.
    pub dispatch: Option<DispatchReport>,
    /// The cycle was abandoned because shutdown was requested.
    pub cancelled: bool,
}

/// Drives probe cycles until cancelled.
pub struct Scheduler {
    config: Arc<dyn ConfigProvider>,
    prober: Arc<dyn Probe>,
    dispatcher: NotificationDispatcher,
    bus: EventBus,
    log: Option<AvailabilityLog>,
    last_config: Option<MonitorConfig>,
}

impl Scheduler {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        prober: Arc<dyn Probe>,
        dispatcher: NotificationDispatcher,
        bus: EventBus,
    ) -> Self {
        Self {
            config,
            prober,
            dispatcher,
            bus,
            log: None,
            last_config: None,
        }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Run cycles until `cancel` fires.
    ///
    /// There is no other exit: probe, log and channel failures are all
    /// absorbed inside the cycle.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Scheduler started");

        while !cancel.is_cancelled() {
            let config = self.load_config().await;
            let started_at = Utc::now();

            let report = self.run_cycle(&config, started_at, &cancel).await;
            if report.cancelled {
                break;
            }

            tracing::debug!(
                interval_secs = config.check_interval_secs,
                "Cycle complete, sleeping"
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.check_interval()) => {}
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Take this cycle's snapshot, falling back to the last good one.
    async fn load_config(&mut self) -> MonitorConfig {
        match self.config.snapshot().await {
            Ok(config) => {
                self.last_config = Some(config.clone());
                config
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration, keeping previous snapshot");
                self.last_config.clone().unwrap_or_default()
            }
        }
    }

    /// Run one cycle against `config`, stamped with `started_at`.
    pub async fn run_cycle(
        &mut self,
        config: &MonitorConfig,
        started_at: Timestamp,
        cancel: &CancellationToken,
    ) -> CycleReport {
        self.ensure_log(&config.log_path).await;

        let mode = config.escalation_mode();
        let timeout = config.request_timeout();
        let mut report = CycleReport::default();
        let mut seen = HashSet::new();

        tracing::debug!(endpoints = config.endpoints.len(), "Cycle started");

        for endpoint in &config.endpoints {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        remaining = config.endpoints.len() - report.results.len(),
                        "Shutdown requested, abandoning cycle"
                    );
                    report.cancelled = true;
                    return report;
                }
                result = self.prober.probe(endpoint, timeout) => result,
            };

            self.bus.status(&result.endpoint, result.signal);

            if let Some(log) = &self.log {
                if let Err(e) = log.append(&started_at, &result).await {
                    tracing::error!(error = %e, endpoint = %result.endpoint, "Failed to write availability log");
                }
            }

            if result.is_degraded() && seen.insert(result.endpoint.clone()) {
                tracing::warn!(
                    endpoint = %result.endpoint,
                    signal = %result.signal,
                    detail = %result.detail,
                    "Endpoint degraded"
                );
                if mode == EscalationMode::Individual {
                    self.bus.warning(
                        WarningTarget::Endpoint(result.endpoint.clone()),
                        result.detail.clone(),
                    );
                }
                report.degraded.push(DegradedEndpoint::from(&result));
            }

            report.results.push(result);
        }

        if !report.degraded.is_empty() {
            let dispatch = self
                .dispatcher
                .dispatch(config, &report.degraded, started_at)
                .await;
            report.dispatch = Some(dispatch);
        }

        report
    }

    /// Open the log destination if it is new or changed since the last cycle.
    ///
    /// On failure the cycle runs without logging and the next cycle retries.
    async fn ensure_log(&mut self, path: &Path) {
        if self.log.as_ref().is_some_and(|log| log.path() == path) {
            return;
        }

        match AvailabilityLog::open(path).await {
            Ok(log) => {
                tracing::info!(path = %path.display(), "Availability log ready");
                self.log = Some(log);
            }
            Err(e) => {
                tracing::error!(error = %e, "Availability log unavailable for this cycle");
                self.log = None;
            }
        }
    }
}
