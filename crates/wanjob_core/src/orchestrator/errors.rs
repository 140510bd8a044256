//! Error types for the job runner.
//!
//! Errors carry context that chains through layers:
//! Run → Attempt → Operation → Detail

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Longest body excerpt kept in an error message.
const EXCERPT_LEN: usize = 200;

/// Why a single attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError {
    /// The submission response carried no usable `event_id`.
    #[error("No event_id in submission response: {excerpt}")]
    NoCorrelationId { excerpt: String },

    /// The remote signalled failure mid-stream.
    #[error("Remote returned an error event: {detail}")]
    RemoteErrorEvent { detail: String },

    /// The stream closed before a success or error record was seen.
    #[error("Stream ended without success after {records} record(s)")]
    StreamExhausted { records: usize },

    /// Network-level failure or unexpected HTTP status.
    #[error("Transport error during {phase}: {message}")]
    Transport { phase: &'static str, message: String },

    /// The streaming phase ran past the hard deadline.
    #[error("No result within {}s", .waited.as_secs())]
    DeadlineExceeded { waited: Duration },

    /// Writing the result file failed.
    #[error("Failed to write result to {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AttemptError {
    /// Create a missing correlation id error with a trimmed body excerpt.
    pub fn no_correlation_id(body: &str) -> Self {
        Self::NoCorrelationId {
            excerpt: excerpt(body),
        }
    }

    /// Create a remote error event error.
    pub fn remote_error(detail: impl Into<String>) -> Self {
        Self::RemoteErrorEvent {
            detail: detail.into(),
        }
    }

    /// Create a transport error for the given phase.
    pub fn transport(phase: &'static str, message: impl ToString) -> Self {
        Self::Transport {
            phase,
            message: message.to_string(),
        }
    }

    /// Create a sink error.
    pub fn sink(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }
}

/// Terminal failure of the whole run.
#[derive(Error, Debug)]
pub enum RunError {
    /// Every attempt failed.
    #[error("All {attempts} attempt(s) failed; last error: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: AttemptError,
    },

    /// An attempt hit the hard deadline.
    #[error("Attempt {attempt} exceeded the {}s deadline", .waited.as_secs())]
    DeadlineExceeded { attempt: u32, waited: Duration },

    /// The run was cancelled from outside.
    #[error("Cancelled during attempt {attempt}")]
    Cancelled { attempt: u32 },
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Exhausted { .. } => 1,
            RunError::DeadlineExceeded { .. } => 124,
            RunError::Cancelled { .. } => 130,
        }
    }
}

/// Result type for attempt operations.
pub type AttemptResult<T> = Result<T, AttemptError>;

/// Result type for a full run.
pub type RunResult<T> = Result<T, RunError>;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_errors_display_context() {
        let deadline = AttemptError::DeadlineExceeded {
            waited: Duration::from_secs(5),
        };
        assert_eq!(deadline.to_string(), "No result within 5s");

        let exhausted = AttemptError::StreamExhausted { records: 4 };
        assert!(exhausted.to_string().contains("4 record(s)"));

        let sink = AttemptError::sink("/out/result.txt", io::Error::other("disk full"));
        assert!(sink.to_string().contains("/out/result.txt"));
        assert!(sink.to_string().contains("disk full"));
    }

    #[test]
    fn excerpt_is_bounded() {
        let body = "x".repeat(1000);
        let err = AttemptError::no_correlation_id(&body);
        let msg = err.to_string();
        assert!(msg.len() < 300);
        assert!(msg.ends_with("..."));

        assert!(AttemptError::no_correlation_id("  ")
            .to_string()
            .contains("<empty body>"));
    }

    #[test]
    fn run_error_exit_codes() {
        let exhausted = RunError::Exhausted {
            attempts: 3,
            last: AttemptError::StreamExhausted { records: 2 },
        };
        assert_eq!(exhausted.exit_code(), 1);
        assert!(exhausted.to_string().contains("All 3 attempt(s)"));

        let deadline = RunError::DeadlineExceeded {
            attempt: 1,
            waited: Duration::from_secs(60),
        };
        assert_eq!(deadline.exit_code(), 124);
        assert_eq!(RunError::Cancelled { attempt: 2 }.exit_code(), 130);
    }

    #[test]
    fn transport_error_names_phase() {
        let err = AttemptError::transport("submit", "HTTP 503");
        assert_eq!(err.to_string(), "Transport error during submit: HTTP 503");
    }
}
