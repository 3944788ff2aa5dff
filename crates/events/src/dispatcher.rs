//! Throttled, policy-driven alert dispatch.
//!
//! [`NotificationDispatcher`] turns a cycle's degraded-set into one aggregate
//! [`AlertMessage`], offers it to every registered [`AlertChannel`] that the
//! [`AlertThrottle`] lets through, and applies the UI escalation policy.

use std::sync::Arc;

use serde::Serialize;

use sitewatch_core::alert::{AlertMessage, DegradedEndpoint};
use sitewatch_core::channels::Channel;
use sitewatch_core::config::{EscalationMode, MonitorConfig};
use sitewatch_core::types::Timestamp;

use crate::bus::{EventBus, WarningTarget};
use crate::delivery::AlertChannel;
use crate::throttle::{AlertThrottle, Clock, SystemClock};

/// What happened to each channel during one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: Vec<Channel>,
    pub suppressed: Vec<Channel>,
    pub failed: Vec<Channel>,
}

/// Sends aggregate alerts through the registered channels.
///
/// Owns the throttle state; nothing else mutates it.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
    throttle: AlertThrottle,
    clock: Arc<dyn Clock>,
    bus: EventBus,
}

impl NotificationDispatcher {
    pub fn new(bus: EventBus) -> Self {
        Self {
            channels: Vec::new(),
            throttle: AlertThrottle::new(),
            clock: Arc::new(SystemClock),
            bus,
        }
    }

    /// Register a channel. Channels are tried in registration order.
    pub fn with_channel(mut self, channel: Arc<dyn AlertChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Replace the clock used to time sends.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn throttle(&self) -> &AlertThrottle {
        &self.throttle
    }

    /// Dispatch the degraded-set of the cycle that started at `cycle_timestamp`.
    ///
    /// `cycle_timestamp` only stamps the alert. Throttle spacing uses the
    /// clock reading taken once the channel's guard is held.
    ///
    /// Channel failures are logged and reported, never returned: the cycle
    /// must go on regardless of notification health.
    pub async fn dispatch(
        &self,
        config: &MonitorConfig,
        degraded: &[DegradedEndpoint],
        cycle_timestamp: Timestamp,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(alert) = AlertMessage::compose(degraded, cycle_timestamp) else {
            return report;
        };

        for channel in &self.channels {
            let kind = channel.channel();
            let policy = config.channel_policy(kind);
            if !policy.enabled {
                tracing::debug!(channel = %kind, "Channel disabled, skipping");
                continue;
            }

            let mut guard = self.throttle.acquire(kind).await;
            let now = self.clock.now();
            if !guard.may_send(policy, now) {
                tracing::debug!(
                    channel = %kind,
                    min_interval_secs = policy.min_interval.as_secs(),
                    "Alert suppressed by throttle"
                );
                report.suppressed.push(kind);
                continue;
            }

            match channel.deliver(config, &alert).await {
                Ok(()) => {
                    guard.record_sent(now);
                    report.sent.push(kind);
                }
                Err(e) => {
                    tracing::warn!(channel = %kind, error = %e, "Alert delivery failed");
                    report.failed.push(kind);
                }
            }
        }

        // Published after every throttle guard has been released.
        if config.escalation_mode() == EscalationMode::Aggregate {
            self.bus.warning(WarningTarget::Aggregate, alert.body.clone());
        }

        tracing::info!(
            degraded = degraded.len(),
            sent = ?report.sent,
            suppressed = ?report.suppressed,
            failed = ?report.failed,
            "Alert dispatch finished"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
