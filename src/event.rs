//! Parsed access-log events
//!
//! A [`LogEvent`] is produced once per well-formed log line by the parser and is
//! consumed by the aggregation engine. Only the request path takes part in
//! aggregation; the remaining fields are carried for sinks and diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod builder;

// Export EventBuilder for tests and generators
pub use builder::EventBuilder;

/// One structured access-log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Remote host that issued the request
    pub client: String,
    /// Authenticated user (`-` when absent)
    pub user: String,
    /// Time the request was logged, normalised to UTC
    pub occurred_at: DateTime<Utc>,
    /// HTTP method
    pub method: String,
    /// Request path as written in the log
    pub path: String,
    /// HTTP status code
    pub status: u16,
    /// Response size in bytes (`-` is recorded as 0)
    pub size: u64,
}

impl LogEvent {
    /// Create an event carrying only a path, stamped with the current time
    pub fn for_path(path: impl Into<String>) -> Self {
        EventBuilder::new().path(path).build()
    }
}
