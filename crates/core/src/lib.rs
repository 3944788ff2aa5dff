//! Domain types shared by the sitewatch crates.
//!
//! This crate has no I/O: it holds the configuration snapshot, probe
//! classification, alert composition, and channel identifiers so the
//! scheduler, the dispatcher, and their tests all agree on one model.

pub mod alert;
pub mod channels;
pub mod config;
pub mod error;
pub mod probe;
pub mod types;
