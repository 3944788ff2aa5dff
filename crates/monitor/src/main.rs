//! `sitewatch` -- endpoint availability monitor.
//!
//! Probes the configured endpoints on a fixed interval, appends every result
//! to a CSV availability log, and sends throttled email / webhook alerts when
//! endpoints degrade.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default         | Description                        |
//! |----------------------|----------|-----------------|------------------------------------|
//! | `SITEWATCH_SETTINGS` | no       | `settings.json` | JSON settings file, re-read per cycle |
//! | `RUST_LOG`           | no       | `sitewatch_monitor=info,sitewatch_events=info` | Log filter |

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitewatch_events::{bus, EmailDelivery, EventBus, NotificationDispatcher, WebhookDelivery};
use sitewatch_monitor::presenter::ConsolePresenter;
use sitewatch_monitor::prober::HttpProber;
use sitewatch_monitor::scheduler::Scheduler;
use sitewatch_monitor::settings::SettingsFile;

/// How long shutdown waits for each background task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitewatch_monitor=info,sitewatch_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = SettingsFile::from_env();
    tracing::info!(path = %settings.path().display(), "Starting sitewatch");

    let prober = HttpProber::new().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build probe HTTP client");
        std::process::exit(1);
    });

    let webhook = WebhookDelivery::new().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build webhook HTTP client");
        std::process::exit(1);
    });

    // --- UI events ---
    let (event_bus, ui_events) = EventBus::channel();
    let ui_handle = tokio::spawn(bus::deliver(ui_events, ConsolePresenter::default()));

    // --- Dispatcher ---
    let dispatcher = NotificationDispatcher::new(event_bus.clone())
        .with_channel(Arc::new(EmailDelivery::new()))
        .with_channel(Arc::new(webhook));

    // --- Scheduler ---
    let scheduler = Scheduler::new(Arc::new(settings), Arc::new(prober), dispatcher, event_bus);
    let cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    shutdown_signal().await;

    cancel.cancel();
    join_with_grace("scheduler", scheduler_handle, SHUTDOWN_GRACE).await;

    // The scheduler owned every bus handle, so the UI pump drains and ends.
    join_with_grace("ui", ui_handle, SHUTDOWN_GRACE).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait up to `grace` for a background task to finish during shutdown.
///
/// Returns `true` if the task ended cleanly. Timeouts and task failures are
/// logged, never propagated.
async fn join_with_grace<T>(task: &str, handle: JoinHandle<T>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::error!(task, error = %e, "Task failed during shutdown");
            false
        }
        Err(_) => {
            tracing::warn!(task, grace_secs = grace.as_secs(), "Task did not stop in time");
            false
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
