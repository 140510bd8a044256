//! Classification of event records.
//!
//! Acceptance is marker presence in the raw text, not a schema check.

use super::record::EventRecord;

/// Marks a record the remote uses to report failure.
pub const ERROR_MARKER: &str = "event: error";
/// Marks a data record.
pub const DATA_MARKER: &str = "event: data";
/// Present in data records that reference an output file.
pub const PATH_MARKER: &str = "path";

/// What a record means for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Data record carrying a file reference. The raw text is the result.
    Success,
    /// The remote reported an error. The attempt fails.
    ErrorEvent,
    /// Heartbeats, progress and everything else. Skipped.
    Irrelevant,
}

/// Classify one record. An error marker wins over a success marker.
pub fn classify(record: &EventRecord) -> Classification {
    let raw = record.raw();
    if raw.contains(ERROR_MARKER) {
        Classification::ErrorEvent
    } else if raw.contains(DATA_MARKER) && raw.contains(PATH_MARKER) {
        Classification::Success
    } else {
        Classification::Irrelevant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(text: &str) -> Classification {
        classify(&EventRecord::parse(text))
    }

    #[test]
    fn data_with_path_is_success() {
        assert_eq!(
            class_of("event: data\ndata: [{\"video\":{\"path\":\"/tmp/out.mp4\"}}]"),
            Classification::Success
        );
    }

    #[test]
    fn data_without_path_is_irrelevant() {
        assert_eq!(class_of("event: data\ndata: [0.5]"), Classification::Irrelevant);
    }

    #[test]
    fn error_marker_is_error() {
        assert_eq!(class_of("event: error\ndata: null"), Classification::ErrorEvent);
    }

    #[test]
    fn error_beats_success() {
        assert_eq!(
            class_of("event: error\ndata: path\nevent: data"),
            Classification::ErrorEvent
        );
    }

    #[test]
    fn heartbeats_and_noise_are_irrelevant() {
        assert_eq!(class_of("event: heartbeat\ndata: null"), Classification::Irrelevant);
        assert_eq!(class_of(""), Classification::Irrelevant);
        assert_eq!(class_of(": keep-alive"), Classification::Irrelevant);
    }

    #[test]
    fn markers_are_literal() {
        // No space after the colon: not the marker the remote sends
        assert_eq!(class_of("event:error"), Classification::Irrelevant);
        assert_eq!(class_of("event:data\ndata: path"), Classification::Irrelevant);
    }
}
