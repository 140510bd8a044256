//! Job orchestration: attempts, retries and liveness.
//!
//! A run is a bounded sequence of independent attempts. Each attempt
//! submits the job, follows its event stream until a terminal record and
//! writes the winning record to the result file.
//!
//! # Architecture
//!
//! ```text
//! JobRunner (retry loop, backoff, cancellation)
//!     └── run_attempt
//!             ├── JobApi::submit           -> CorrelationId
//!             ├── LivenessGuard            (heartbeat + deadline)
//!             │     ├── JobApi::open_stream
//!             │     └── await_outcome      -> EventRecord
//!             └── ResultSink::save
//! ```
//!
//! # Example
//!
//! ```no_run
//! use wanjob_core::client::HttpJobApi;
//! use wanjob_core::config::Settings;
//! use wanjob_core::orchestrator::JobRunner;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let api = HttpJobApi::new(&settings.endpoint)?;
//! let runner = JobRunner::from_settings(api, &settings);
//!
//! let summary = runner.run().await?;
//! println!("Finished on attempt {}", summary.attempts);
//! # Ok(())
//! # }
//! ```

mod attempt;
mod errors;
mod guard;
mod runner;

pub use attempt::{run_attempt, AttemptSuccess};
pub use errors::{AttemptError, AttemptResult, RunError, RunResult};
pub use guard::{with_deadline, GuardConfig, Heartbeat, LivenessGuard};
pub use runner::{CancelHandle, JobRunner, RetryPolicy, RunSummary};
