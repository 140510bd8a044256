//! Retry loop around single attempts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use super::attempt::run_attempt;
use super::errors::{AttemptError, RunError, RunResult};
use super::guard::GuardConfig;
use crate::client::{CorrelationId, JobApi};
use crate::config::{RetrySettings, Settings};
use crate::events::EventRecord;
use crate::job::JobRequest;
use crate::logging::MessagePrefix;
use crate::sink::ResultSink;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed wait after each failed attempt except the last.
    pub backoff: Duration,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(retry: &RetrySettings) -> Self {
        Self {
            max_attempts: retry.max_attempts,
            backoff: retry.backoff(),
        }
    }
}

/// Handle for cancelling a running job.
///
/// Cancellation interrupts an attempt in flight or the wait before the
/// next one.
#[derive(Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Attempt number that succeeded (1-based).
    pub attempts: u32,
    pub correlation_id: CorrelationId,
    pub record: EventRecord,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// Drives attempts until one succeeds, the budget runs out, the deadline
/// is hit or the run is cancelled.
pub struct JobRunner<A> {
    api: A,
    request: JobRequest,
    policy: RetryPolicy,
    guard: GuardConfig,
    sink: ResultSink,
    cancel: CancelHandle,
}

impl<A: JobApi> JobRunner<A> {
    pub fn new(
        api: A,
        request: JobRequest,
        policy: RetryPolicy,
        guard: GuardConfig,
        sink: ResultSink,
    ) -> Self {
        Self {
            api,
            request,
            policy,
            guard,
            sink,
            cancel: CancelHandle::new(),
        }
    }

    pub fn from_settings(api: A, settings: &Settings) -> Self {
        Self::new(
            api,
            JobRequest::from_settings(&settings.job),
            RetryPolicy::from(&settings.retry),
            GuardConfig::from(&settings.timing),
            ResultSink::new(settings.output.result_path.clone()),
        )
    }

    /// Get a cancellation handle for this runner.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run attempts in sequence.
    ///
    /// Each failed attempt is logged and followed by the backoff wait,
    /// except the last one. A deadline hit ends the run immediately.
    pub async fn run(&self) -> RunResult<RunSummary> {
        let total = self.policy.max_attempts.max(1);
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            if self.cancel.is_cancelled() {
                warn!(
                    "{}",
                    MessagePrefix::Warning.format(&format!("Cancelled before attempt {}", attempt))
                );
                return Err(RunError::Cancelled { attempt });
            }

            info!(
                "{}",
                MessagePrefix::Phase.format(&format!("Attempt {}/{}", attempt, total))
            );

            let outcome = tokio::select! {
                outcome = run_attempt(&self.api, &self.request, &self.guard, &self.sink) => outcome,
                _ = self.cancel.cancelled() => {
                    warn!(
                        "{}",
                        MessagePrefix::Warning.format(&format!("Cancelled during attempt {}", attempt))
                    );
                    return Err(RunError::Cancelled { attempt });
                }
            };

            let err = match outcome {
                Ok(success) => {
                    info!(
                        "{}",
                        MessagePrefix::Success.format(&format!(
                            "Job finished on attempt {}/{}",
                            attempt, total
                        ))
                    );
                    return Ok(RunSummary {
                        attempts: attempt,
                        correlation_id: success.correlation_id,
                        record: success.record,
                        output_path: self.sink.path().to_path_buf(),
                        elapsed: started.elapsed(),
                    });
                }
                Err(AttemptError::DeadlineExceeded { waited }) => {
                    error!(
                        "{}",
                        MessagePrefix::Fatal.format(&format!(
                            "No result within {}s, giving up",
                            waited.as_secs()
                        ))
                    );
                    return Err(RunError::DeadlineExceeded { attempt, waited });
                }
                Err(err) => err,
            };

            error!(
                "{}",
                MessagePrefix::Error.format(&format!("Attempt {} failed: {}", attempt, err))
            );

            if attempt >= total {
                error!(
                    "{}",
                    MessagePrefix::Fatal.format(&format!("Max retries ({}) reached", total))
                );
                return Err(RunError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            info!("Retrying in {}s...", self.policy.backoff.as_secs());
            tokio::select! {
                _ = sleep(self.policy.backoff) => {}
                _ = self.cancel.cancelled() => {
                    warn!(
                        "{}",
                        MessagePrefix::Warning.format("Cancelled while waiting to retry")
                    );
                    return Err(RunError::Cancelled { attempt });
                }
            }

            attempt += 1;
        }
    }
}
