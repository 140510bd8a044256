//! One attempt: submit, stream until decided, persist.

use tracing::info;

use super::errors::AttemptResult;
use super::guard::{GuardConfig, LivenessGuard};
use crate::client::{CorrelationId, JobApi};
use crate::events::{await_outcome, EventRecord, EventStreamReader};
use crate::job::JobRequest;
use crate::logging::MessagePrefix;
use crate::sink::ResultSink;

/// What a successful attempt produced.
#[derive(Debug, Clone)]
pub struct AttemptSuccess {
    pub correlation_id: CorrelationId,
    pub record: EventRecord,
}

/// Run a single attempt with fresh state.
///
/// Nothing is carried over from earlier attempts: a new submission yields a
/// new correlation id and a new stream. The heartbeat and deadline cover
/// opening and reading the stream; they are released before the result is
/// written.
pub async fn run_attempt<A>(
    api: &A,
    request: &JobRequest,
    guard: &GuardConfig,
    sink: &ResultSink,
) -> AttemptResult<AttemptSuccess>
where
    A: JobApi + ?Sized,
{
    let correlation_id = api.submit(request).await?;
    info!(event_id = %correlation_id, "Job submitted");
    info!("Waiting for stream data...");

    let record = {
        let liveness = LivenessGuard::arm(guard, correlation_id.as_str());
        liveness
            .run(async {
                let chunks = api.open_stream(&correlation_id).await?;
                let mut reader = EventStreamReader::new(chunks);
                await_outcome(&mut reader).await
            })
            .await?
    };

    info!("{}", MessagePrefix::Success.format("Result received"));
    info!("{}", record.raw());

    sink.save(record.raw())?;
    info!("Saved result to {}", sink.path().display());

    Ok(AttemptSuccess {
        correlation_id,
        record,
    })
}
