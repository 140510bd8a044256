//! Remote job API: submission and event stream.
//!
//! `JobApi` is the seam between the runner and the network. The runner only
//! ever sees a correlation id and a stream of byte chunks, which keeps the
//! retry and stream logic testable without a server.

mod http;
mod submit;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::job::JobRequest;
use crate::orchestrator::AttemptResult;

pub use http::HttpJobApi;
pub use submit::{parse_correlation_id, CorrelationId};

/// Body of the event stream as it arrives, in arbitrarily sized chunks.
pub type ChunkStream = BoxStream<'static, AttemptResult<Vec<u8>>>;

/// Operations the runner needs from the remote API.
///
/// Implementations never retry; every call is one network operation.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submit the job and return the id of its event stream.
    async fn submit(&self, request: &JobRequest) -> AttemptResult<CorrelationId>;

    /// Open the event stream for a submitted job.
    async fn open_stream(&self, id: &CorrelationId) -> AttemptResult<ChunkStream>;
}
