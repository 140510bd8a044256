//! A single blank-line-delimited event record.

use std::fmt;

/// One event of the server-push stream.
///
/// The raw text is kept untouched; it is what gets persisted on success.
/// The `event:` and `data:` fields are parsed alongside for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    raw: String,
    event: Option<String>,
    data: Option<String>,
}

impl EventRecord {
    /// Parse the field lines of a record.
    ///
    /// Lines starting with `:` are comments. A single space after the colon
    /// is dropped. Multiple `data:` lines are joined with `\n`; the last
    /// `event:` line wins.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut event = None;
        let mut data: Option<String> = None;

        for line in raw.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => event = Some(value.to_string()),
                "data" => match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                _ => {}
            }
        }

        Self { raw, event, data }
    }

    /// Exact text of the record as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value of the `event:` field, if any.
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Joined `data:` payload, if any.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_and_data() {
        let record = EventRecord::parse("event: data\ndata: {\"path\":\"x\"}");
        assert_eq!(record.event(), Some("data"));
        assert_eq!(record.data(), Some("{\"path\":\"x\"}"));
        assert_eq!(record.raw(), "event: data\ndata: {\"path\":\"x\"}");
    }

    #[test]
    fn joins_multiline_data() {
        let record = EventRecord::parse("data: first\ndata:second\n: comment\nid: 7");
        assert_eq!(record.event(), None);
        assert_eq!(record.data(), Some("first\nsecond"));
    }

    #[test]
    fn tolerates_crlf_and_bare_fields() {
        let record = EventRecord::parse("event: heartbeat\r\ndata\r\n");
        assert_eq!(record.event(), Some("heartbeat"));
        assert_eq!(record.data(), Some(""));
        assert!(record.raw().ends_with("\r\n"));
    }

    #[test]
    fn empty_record() {
        let record = EventRecord::parse("");
        assert_eq!(record.event(), None);
        assert_eq!(record.data(), None);
        assert_eq!(record.to_string(), "");
    }
}
