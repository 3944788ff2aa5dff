//! Ordered UI event channel between the scheduler and the presentation layer.
//!
//! The scheduler never touches presentation state. It publishes [`UiEvent`]s
//! on an [`EventBus`]; the presentation side drains them in issue order and
//! forwards each one to its [`UiCallbacks`] implementation.

use serde::Serialize;
use tokio::sync::mpsc;

use sitewatch_core::probe::Signal;

// ---------------------------------------------------------------------------
// UiEvent
// ---------------------------------------------------------------------------

/// Who a warning is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "endpoint", rename_all = "lowercase")]
pub enum WarningTarget {
    /// A single endpoint (individual escalation mode).
    Endpoint(String),
    /// The whole degraded-set of a cycle (aggregate escalation mode).
    Aggregate,
}

impl std::fmt::Display for WarningTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningTarget::Endpoint(endpoint) => f.write_str(endpoint),
            WarningTarget::Aggregate => f.write_str("all sites"),
        }
    }
}

/// An update for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Indicator colour for one endpoint.
    Status { endpoint: String, signal: Signal },
    /// User-facing warning.
    Warning { target: WarningTarget, detail: String },
}

// ---------------------------------------------------------------------------
// UiCallbacks
// ---------------------------------------------------------------------------

/// Implemented by the presentation layer.
pub trait UiCallbacks: Send {
    fn on_status(&mut self, endpoint: &str, signal: Signal);
    fn on_warning(&mut self, target: &WarningTarget, detail: &str);
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Fire-and-forget publisher for [`UiEvent`]s.
///
/// Backed by an unbounded `tokio::sync::mpsc` channel, so publishing never
/// blocks and events arrive in the order they were published. Cloning the
/// bus yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::UnboundedSender<UiEvent>,
}

impl EventBus {
    /// Create a bus and the receiving end the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Publish an event.
    ///
    /// If the presentation layer has gone away the event is dropped.
    pub fn publish(&self, event: UiEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("UI receiver closed, dropping event");
        }
    }

    pub fn status(&self, endpoint: &str, signal: Signal) {
        self.publish(UiEvent::Status {
            endpoint: endpoint.to_string(),
            signal,
        });
    }

    pub fn warning(&self, target: WarningTarget, detail: impl Into<String>) {
        self.publish(UiEvent::Warning {
            target,
            detail: detail.into(),
        });
    }
}

/// Drain `receiver` into `callbacks` until every [`EventBus`] handle is dropped.
pub async fn deliver<C: UiCallbacks>(
    mut receiver: mpsc::UnboundedReceiver<UiEvent>,
    mut callbacks: C,
) -> C {
    while let Some(event) = receiver.recv().await {
        match event {
            UiEvent::Status { endpoint, signal } => callbacks.on_status(&endpoint, signal),
            UiEvent::Warning { target, detail } => callbacks.on_warning(&target, &detail),
        }
    }
    tracing::debug!("UI event bus closed");
    callbacks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
