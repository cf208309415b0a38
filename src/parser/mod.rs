//! Common Log Format parser
//!
//! Turns one access-log line such as
//!
//! ```text
//! 127.0.0.1 - james [09/May/2018:16:00:39 +0000] "GET /report HTTP/1.0" 200 1234
//! ```
//!
//! into a [`LogEvent`]. Parsing is pure and stateless; callers decide what to do
//! with lines that fail (the log source drops them with a warning).

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::LogEvent;

pub mod error;

pub use error::ParseError;

/// Timestamp layout used inside the square brackets
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Same layout with a `+hh:mm` offset, as some writers emit
const TIMESTAMP_FORMAT_COLON: &str = "%d/%b/%Y:%H:%M:%S %:z";

static LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<client>\S+)\s\S+\s(?P<user>\S+)\s\[(?P<datetime>[^\]]+)\]\s"(?P<method>[A-Z]+)\s(?P<path>[^\s"]+)?\sHTTP/[0-9.]+"\s(?P<status>[0-9]{3})\s(?P<size>[0-9]+|-)"#,
    )
    .expect("log line pattern is valid")
});

/// Parse a single Common Log Format line
pub fn parse_line(line: &str) -> Result<LogEvent, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = LOG_LINE
        .captures(line)
        .ok_or_else(|| ParseError::no_match(line))?;

    let raw_time = &caps["datetime"];
    let occurred_at = DateTime::parse_from_str(raw_time, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_str(raw_time, TIMESTAMP_FORMAT_COLON))
        .map_err(|e| ParseError::invalid_timestamp(raw_time, e.to_string()))?
        .with_timezone(&Utc);

    let raw_status = &caps["status"];
    let status = raw_status
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidStatus {
            value: raw_status.to_string(),
        })?;

    let size = match &caps["size"] {
        "-" => 0,
        raw => raw.parse::<u64>().map_err(|_| ParseError::InvalidSize {
            value: raw.to_string(),
        })?,
    };

    Ok(LogEvent {
        client: caps["client"].to_string(),
        user: caps["user"].to_string(),
        occurred_at,
        method: caps["method"].to_string(),
        // A request line without a target is still a hit on the root
        path: caps
            .name("path")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        status,
        size,
    })
}

/// Format a timestamp the way access logs write it
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}
