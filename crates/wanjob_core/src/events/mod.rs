//! Server-push event stream handling.
//!
//! ```text
//! chunks ──▶ EventBuffer ──▶ EventRecord ──▶ classify
//!            (split on \n\n)  (event:/data:)   (success / error / skip)
//! ```

mod buffer;
mod classify;
mod reader;
mod record;

pub use buffer::{EventBuffer, DELIMITER};
pub use classify::{classify, Classification, DATA_MARKER, ERROR_MARKER, PATH_MARKER};
pub use reader::{await_outcome, EventStreamReader};
pub use record::EventRecord;
