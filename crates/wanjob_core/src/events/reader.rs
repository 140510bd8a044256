//! Lazy, forward-only reader turning a chunk stream into event records.

use std::collections::VecDeque;

use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use super::buffer::EventBuffer;
use super::classify::{classify, Classification};
use super::record::EventRecord;
use crate::orchestrator::{AttemptError, AttemptResult};

/// Reads records from a stream of byte chunks.
///
/// A new chunk is only pulled when every record completed by the previous
/// chunks has been handed out, so stopping early leaves the rest of the
/// stream unread.
pub struct EventStreamReader<S> {
    chunks: S,
    buffer: EventBuffer,
    ready: VecDeque<String>,
    finished: bool,
    records_seen: usize,
}

impl<S> EventStreamReader<S>
where
    S: Stream<Item = AttemptResult<Vec<u8>>> + Unpin,
{
    pub fn new(chunks: S) -> Self {
        Self {
            chunks,
            buffer: EventBuffer::new(),
            ready: VecDeque::new(),
            finished: false,
            records_seen: 0,
        }
    }

    /// Next complete record, or `None` once the transport has ended.
    ///
    /// A non-empty tail left when the stream ends is not a record and is
    /// discarded.
    pub async fn next_record(&mut self) -> AttemptResult<Option<EventRecord>> {
        loop {
            if let Some(raw) = self.ready.pop_front() {
                self.records_seen += 1;
                return Ok(Some(EventRecord::parse(raw)));
            }
            if self.finished {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    trace!(bytes = chunk.len(), "Received chunk");
                    self.ready.extend(self.buffer.push(&chunk));
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                None => {
                    self.finished = true;
                    if !self.buffer.is_empty() {
                        debug!(
                            bytes = self.buffer.len(),
                            "Stream ended with an undelimited tail, discarding"
                        );
                    }
                }
            }
        }
    }

    /// Number of records handed out so far.
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }
}

/// Consume records until one decides the attempt.
///
/// Returns the first `Success` record. The first `ErrorEvent` fails with
/// `RemoteErrorEvent`; running out of stream fails with `StreamExhausted`.
pub async fn await_outcome<S>(reader: &mut EventStreamReader<S>) -> AttemptResult<EventRecord>
where
    S: Stream<Item = AttemptResult<Vec<u8>>> + Unpin,
{
    while let Some(record) = reader.next_record().await? {
        match classify(&record) {
            Classification::Success => return Ok(record),
            Classification::ErrorEvent => {
                let detail = record.data().unwrap_or(record.raw());
                return Err(AttemptError::remote_error(detail));
            }
            Classification::Irrelevant => {
                debug!(
                    event = record.event().unwrap_or("-"),
                    "Skipping record #{}",
                    reader.records_seen()
                );
            }
        }
    }

    Err(AttemptError::StreamExhausted {
        records: reader.records_seen(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chunks(parts: &[&str]) -> impl Stream<Item = AttemptResult<Vec<u8>>> + Unpin {
        let owned: Vec<AttemptResult<Vec<u8>>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn yields_records_in_order() {
        let mut reader = EventStreamReader::new(chunks(&[
            "event: a\n",
            "\nevent: b\n\nev",
            "ent: c\n\n",
        ]));

        let mut kinds = Vec::new();
        while let Some(record) = reader.next_record().await.unwrap() {
            kinds.push(record.event().unwrap().to_string());
        }
        assert_eq!(kinds, vec!["a", "b", "c"]);
        assert_eq!(reader.records_seen(), 3);
    }

    #[tokio::test]
    async fn tail_without_delimiter_is_not_a_record() {
        let mut reader = EventStreamReader::new(chunks(&["event: a\n\nevent: data\ndata: path"]));
        assert!(reader.next_record().await.unwrap().is_some());
        assert!(reader.next_record().await.unwrap().is_none());
        assert!(reader.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn success_split_across_chunks() {
        let mut reader = EventStreamReader::new(chunks(&[
            "event: data\ndata: {\"path\":\"x\"}",
            "\n\n",
        ]));
        let record = await_outcome(&mut reader).await.unwrap();
        assert_eq!(record.raw(), "event: data\ndata: {\"path\":\"x\"}");
        assert_eq!(reader.records_seen(), 1);
    }

    #[tokio::test]
    async fn skips_irrelevant_until_success() {
        let mut reader = EventStreamReader::new(chunks(&[
            "event: heartbeat\ndata: null\n\n",
            "event: generating\ndata: [0.4]\n\n",
            "event: data\ndata: [{\"path\":\"/out.mp4\"}]\n\n",
        ]));
        let record = await_outcome(&mut reader).await.unwrap();
        assert_eq!(record.event(), Some("data"));
        assert_eq!(reader.records_seen(), 3);
    }

    #[tokio::test]
    async fn error_event_fails_attempt() {
        let mut reader = EventStreamReader::new(chunks(&[
            "event: heartbeat\n\n",
            "event: error\ndata: \"GPU quota exceeded\"\n\n",
        ]));
        let err = await_outcome(&mut reader).await.unwrap_err();
        match err {
            AttemptError::RemoteErrorEvent { detail } => {
                assert_eq!(detail, "\"GPU quota exceeded\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn exhausted_without_terminal_record() {
        let mut reader =
            EventStreamReader::new(chunks(&["event: heartbeat\n\n", "event: data\ndata: []\n\n"]));
        let err = await_outcome(&mut reader).await.unwrap_err();
        assert!(matches!(err, AttemptError::StreamExhausted { records: 2 }));
    }

    #[tokio::test]
    async fn empty_stream_is_exhausted() {
        let mut reader = EventStreamReader::new(chunks(&[]));
        let err = await_outcome(&mut reader).await.unwrap_err();
        assert!(matches!(err, AttemptError::StreamExhausted { records: 0 }));
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let parts: Vec<AttemptResult<Vec<u8>>> = vec![
            Ok(b"event: heartbeat\n\n".to_vec()),
            Err(AttemptError::transport("stream", "connection reset")),
        ];
        let mut reader = EventStreamReader::new(stream::iter(parts));
        let err = await_outcome(&mut reader).await.unwrap_err();
        assert!(matches!(err, AttemptError::Transport { phase: "stream", .. }));
    }

    #[tokio::test]
    async fn stops_pulling_after_terminal_record() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let source = stream::iter(vec![
            "event: error\ndata: null\n\n",
            "event: data\ndata: path\n\n",
            "event: heartbeat\n\n",
        ])
        .map(move |part| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AttemptError>(part.as_bytes().to_vec())
        });

        let mut reader = EventStreamReader::new(source);
        let err = await_outcome(&mut reader).await.unwrap_err();
        assert!(matches!(err, AttemptError::RemoteErrorEvent { .. }));
        assert_eq!(pulled.load(Ordering::SeqCst), 1);
    }
}
