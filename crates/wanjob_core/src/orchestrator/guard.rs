//! Liveness guard for the streaming phase of an attempt.
//!
//! Two things run alongside a stream that may stay silent for a long time:
//! a heartbeat that logs progress at a fixed period, and a hard deadline
//! that gives up on the attempt. Both are scoped: leaving the guarded
//! section by any path stops the heartbeat.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use super::errors::{AttemptError, AttemptResult};
use crate::config::TimingSettings;

/// Periods used by [`LivenessGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    pub heartbeat: Duration,
    pub deadline: Duration,
}

impl GuardConfig {
    pub fn new(heartbeat: Duration, deadline: Duration) -> Self {
        Self {
            heartbeat,
            deadline,
        }
    }
}

impl From<&TimingSettings> for GuardConfig {
    fn from(timing: &TimingSettings) -> Self {
        Self::new(timing.heartbeat(), timing.deadline())
    }
}

/// Background task logging "still waiting" once per period.
///
/// The first beat fires one full period after start. The task is aborted
/// when the handle is dropped.
pub struct Heartbeat {
    task: JoinHandle<()>,
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Start beating. Must be called from within a tokio runtime.
    pub fn start(period: Duration, label: impl Into<String>) -> Self {
        let beats = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&beats);
        let label = label.into();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = interval_at(started + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let beat = counter.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    beat,
                    "Still waiting for {} ({}s elapsed)",
                    label,
                    started.elapsed().as_secs()
                );
            }
        });

        Self { task, beats }
    }

    /// Beats emitted so far.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `fut`, failing with `DeadlineExceeded` once `limit` has elapsed.
///
/// The future is dropped at the deadline.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> AttemptResult<T>
where
    F: Future<Output = AttemptResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::DeadlineExceeded { waited: limit }),
    }
}

/// Heartbeat and deadline armed together for one streaming phase.
pub struct LivenessGuard {
    heartbeat: Heartbeat,
    deadline: Duration,
}

impl LivenessGuard {
    pub fn arm(config: &GuardConfig, label: impl Into<String>) -> Self {
        Self {
            heartbeat: Heartbeat::start(config.heartbeat, label),
            deadline: config.deadline,
        }
    }

    /// Drive `fut` under the deadline.
    pub async fn run<F, T>(&self, fut: F) -> AttemptResult<T>
    where
        F: Future<Output = AttemptResult<T>>,
    {
        with_deadline(self.deadline, fut).await
    }

    pub fn beats(&self) -> u64 {
        self.heartbeat.beats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{await_outcome, EventStreamReader};
    use futures_util::stream;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn first_beat_after_one_period() {
        let heartbeat = Heartbeat::start(Duration::from_secs(60), "job");

        sleep(Duration::from_secs(59)).await;
        assert_eq!(heartbeat.beats(), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(heartbeat.beats(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_heartbeat() {
        let heartbeat = Heartbeat::start(Duration::from_secs(10), "job");
        let beats = Arc::clone(&heartbeat.beats);

        sleep(Duration::from_secs(35)).await;
        assert_eq!(heartbeat.beats(), 3);

        drop(heartbeat);
        sleep(Duration::from_secs(100)).await;
        assert_eq!(beats.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cuts_off_silent_stream() {
        let config = GuardConfig::new(Duration::from_secs(60), Duration::from_secs(200));
        let guard = LivenessGuard::arm(&config, "abc");
        let started = Instant::now();

        let result: AttemptResult<()> = guard.run(std::future::pending()).await;

        match result {
            Err(AttemptError::DeadlineExceeded { waited }) => {
                assert_eq!(waited, Duration::from_secs(200));
            }
            other => panic!("expected deadline, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(200));
        assert_eq!(guard.beats(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_while_chunks_keep_arriving() {
        let chatter = stream::unfold((), |()| async {
            sleep(Duration::from_secs(5)).await;
            let chunk = b"event: heartbeat\ndata: null\n\n".to_vec();
            Some((Ok::<_, AttemptError>(chunk), ()))
        });
        let mut reader = EventStreamReader::new(Box::pin(chatter));
        let config = GuardConfig::new(Duration::from_secs(30), Duration::from_secs(100));
        let guard = LivenessGuard::arm(&config, "chatty");
        let started = Instant::now();

        let result = guard.run(await_outcome(&mut reader)).await;

        match result {
            Err(AttemptError::DeadlineExceeded { waited }) => {
                assert_eq!(waited, Duration::from_secs(100));
            }
            other => panic!("expected deadline, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(105));
        // The stream never went quiet before the cut-off
        assert!(reader.records_seen() >= 19);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_result_passes_through() {
        let result = with_deadline(Duration::from_secs(5), async {
            sleep(Duration::from_secs(1)).await;
            Ok::<_, AttemptError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);

        let failed: AttemptResult<()> = with_deadline(Duration::from_secs(5), async {
            Err(AttemptError::StreamExhausted { records: 0 })
        })
        .await;
        assert!(matches!(failed, Err(AttemptError::StreamExhausted { .. })));
    }
}
