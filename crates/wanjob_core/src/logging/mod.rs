//! Logging infrastructure for wanjob.
//!
//! This module provides:
//! - Global `tracing` subscriber setup honouring `RUST_LOG`
//! - An optional plain-text log file written off the hot path
//! - Banner prefixes used for attempt and result messages

mod types;

pub use types::{LogLevel, MessagePrefix};

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keeps the background log writer alive. Drop it last, right before exit.
#[must_use = "dropping the guard stops the file writer"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
/// - Mirrors everything to `log_file` (appending) when one is given
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel, log_file: Option<&Path>) -> io::Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(LogGuard { _file: file_guard })
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Info.as_filter_str(), "info");
        assert!(EnvFilter::try_new(LogLevel::Trace.as_filter_str()).is_ok());
    }
}
