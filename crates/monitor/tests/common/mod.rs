#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sitewatch_core::alert::AlertMessage;
use sitewatch_core::channels::Channel;
use sitewatch_core::config::MonitorConfig;
use sitewatch_core::probe::{ProbeOutcome, ProbeResult};
use sitewatch_core::types::Timestamp;
use sitewatch_events::{
    AlertChannel, Clock, DeliveryError, EventBus, NotificationDispatcher, UiEvent,
};
use sitewatch_monitor::prober::Probe;
use sitewatch_monitor::scheduler::{CycleReport, Scheduler};

/// Clock the test moves by hand.
pub struct ManualClock(Mutex<Timestamp>);

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(at(0))))
    }

    pub fn set(&self, now: Timestamp) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, elapsed_ms: u64) {
        *self.0.lock().unwrap() += chrono::Duration::milliseconds(elapsed_ms as i64);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

/// Prober that answers from a script instead of the network.
///
/// Endpoints without a scripted outcome answer HTTP 200 in 120 ms. When a
/// clock is attached, each probe advances it by its elapsed time.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: HashMap<String, (ProbeOutcome, u64)>,
    hang_on: Option<String>,
    clock: Option<Arc<ManualClock>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &str, outcome: ProbeOutcome, elapsed_ms: u64) -> Self {
        self.outcomes
            .insert(endpoint.to_string(), (outcome, elapsed_ms));
        self
    }

    /// Never return when probing `endpoint`.
    pub fn hang_on(mut self, endpoint: &str) -> Self {
        self.hang_on = Some(endpoint.to_string());
        self
    }

    fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProber {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeResult {
        self.calls.lock().unwrap().push(endpoint.to_string());
        if self.hang_on.as_deref() == Some(endpoint) {
            std::future::pending::<()>().await;
        }
        let (outcome, elapsed_ms) = self
            .outcomes
            .get(endpoint)
            .cloned()
            .unwrap_or((ProbeOutcome::Response { status_code: 200 }, 120));
        if let Some(clock) = &self.clock {
            clock.advance(elapsed_ms);
        }
        ProbeResult::classify(endpoint, outcome, Duration::from_millis(elapsed_ms), timeout)
    }
}

/// Alert channel that records every body it is asked to deliver.
pub struct RecordingChannel {
    kind: Channel,
    delivered: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new(kind: Channel) -> Arc<Self> {
        Arc::new(Self {
            kind,
            delivered: Mutex::new(Vec::new()),
        })
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn channel(&self) -> Channel {
        self.kind
    }

    async fn deliver(
        &self,
        _config: &MonitorConfig,
        alert: &AlertMessage,
    ) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(alert.body.clone());
        Ok(())
    }
}

/// A scheduler wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub scheduler: Scheduler,
    pub clock: Arc<ManualClock>,
    pub prober: Arc<ScriptedProber>,
    pub email: Arc<RecordingChannel>,
    pub webhook: Arc<RecordingChannel>,
    pub ui: mpsc::UnboundedReceiver<UiEvent>,
}

pub fn harness(config: MonitorConfig, prober: ScriptedProber) -> Harness {
    let (bus, ui) = EventBus::channel();
    let clock = ManualClock::new();
    let prober = Arc::new(prober.with_clock(clock.clone()));
    let email = RecordingChannel::new(Channel::Email);
    let webhook = RecordingChannel::new(Channel::Webhook);
    let dispatcher = NotificationDispatcher::new(bus.clone())
        .with_clock(clock.clone())
        .with_channel(email.clone())
        .with_channel(webhook.clone());
    let scheduler = Scheduler::new(Arc::new(config), prober.clone(), dispatcher, bus);
    Harness {
        scheduler,
        clock,
        prober,
        email,
        webhook,
        ui,
    }
}

impl Harness {
    /// Run one cycle that starts `secs` after the reference instant.
    pub async fn run_at(&mut self, config: &MonitorConfig, secs: i64) -> CycleReport {
        self.clock.set(at(secs));
        self.scheduler
            .run_cycle(config, at(secs), &CancellationToken::new())
            .await
    }
}

/// Test configuration logging into `dir`.
pub fn test_config(dir: &Path, endpoints: &[&str]) -> MonitorConfig {
    MonitorConfig {
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        check_interval_secs: 1,
        request_timeout_secs: 30,
        log_path: dir.join("availability.csv"),
        ..Default::default()
    }
}

/// A fixed timestamp `secs` after a reference instant.
pub fn at(secs: i64) -> Timestamp {
    chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

/// Everything currently queued on the UI channel.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Data rows of the availability log (header excluded).
pub fn read_rows(path: &Path) -> Vec<String> {
    let contents = std::fs::read_to_string(path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("timestamp,site,status,elapsed_ms,detail"));
    lines.map(str::to_string).collect()
}
