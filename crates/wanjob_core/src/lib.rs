//! wanjob core - submit a remote animation job and wait for its result.
//!
//! This crate holds everything except argument parsing: configuration,
//! logging setup, the HTTP client, the event stream reader and the retry
//! loop. The `wanjob` binary is a thin layer over it.

pub mod client;
pub mod config;
pub mod events;
pub mod job;
pub mod logging;
pub mod orchestrator;
pub mod sink;

pub use orchestrator::{AttemptError, AttemptResult, RunError, RunResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
