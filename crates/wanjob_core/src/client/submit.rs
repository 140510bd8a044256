//! Correlation identifier returned by the submission call.

use std::fmt;

use crate::orchestrator::{AttemptError, AttemptResult};

/// Opaque id addressing one job's event stream. Scoped to one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the `event_id` string from a submission response body.
///
/// Fails with `NoCorrelationId` when the body is not a JSON object or the
/// field is missing, empty or not a string.
pub fn parse_correlation_id(body: &str) -> AttemptResult<CorrelationId> {
    // Other envelope fields are ignored
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|envelope| envelope.get("event_id"))
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .map(|id| CorrelationId(id.to_string()))
        .ok_or_else(|| AttemptError::no_correlation_id(body))
}
