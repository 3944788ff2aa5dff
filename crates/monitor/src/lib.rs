//! `sitewatch-monitor` library crate.
//!
//! Re-exports the scheduler and its collaborators for integration testing.
//! The binary entrypoint lives in `main.rs`.

pub mod availability_log;
pub mod presenter;
pub mod prober;
pub mod scheduler;
pub mod settings;
