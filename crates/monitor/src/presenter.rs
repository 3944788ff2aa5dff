//! Console presentation layer.
//!
//! Renders UI events through `tracing` for headless runs. Indicator updates
//! are only logged at info level when an endpoint's colour changes.

use std::collections::HashMap;

use sitewatch_core::probe::Signal;
use sitewatch_events::{UiCallbacks, WarningTarget};

/// Tracks the last indicator colour per endpoint.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    indicators: HashMap<String, Signal>,
}

impl ConsolePresenter {
    pub fn indicator(&self, endpoint: &str) -> Option<Signal> {
        self.indicators.get(endpoint).copied()
    }
}

impl UiCallbacks for ConsolePresenter {
    fn on_status(&mut self, endpoint: &str, signal: Signal) {
        let previous = self.indicators.insert(endpoint.to_string(), signal);
        if previous != Some(signal) {
            tracing::info!(endpoint, signal = %signal, "Indicator changed");
        } else {
            tracing::debug!(endpoint, signal = %signal, "Indicator unchanged");
        }
    }

    fn on_warning(&mut self, target: &WarningTarget, detail: &str) {
        tracing::warn!(target = %target, detail, "Site Monitor warning");
    }
}
