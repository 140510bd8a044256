//! Incremental splitting of a chunked byte stream into event records.

/// Blank line separating two records.
pub const DELIMITER: &[u8] = b"\n\n";

/// Bytes received but not yet resolved into a complete record.
///
/// Splitting happens on raw bytes, so a chunk boundary may fall anywhere:
/// inside the delimiter or inside a multi-byte character. The buffer never
/// holds a fully delimited record after `push` returns.
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: Vec<u8>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every record it completes, in order.
    ///
    /// Record text is the span between delimiters, decoded lossily.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Only the last DELIMITER.len() - 1 old bytes can start a new match
        let mut search_from = self.pending.len().saturating_sub(DELIMITER.len() - 1);
        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = find(&self.pending[search_from..], DELIMITER) {
            let end = search_from + pos;
            records.push(String::from_utf8_lossy(&self.pending[consumed..end]).into_owned());
            consumed = end + DELIMITER.len();
            search_from = consumed;
        }

        if consumed > 0 {
            self.pending.drain(..consumed);
        }
        records
    }

    /// Bytes after the last delimiter.
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
