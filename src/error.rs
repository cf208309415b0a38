//! Error types for the traffic monitor

use thiserror::Error;

use crate::parser::ParseError;

/// Main error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A log line could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A notification sink failed to deliver
    #[error("Notification error in sink '{sink}': {message}")]
    Notification {
        /// Name of the failing sink
        sink: String,
        /// Error description
        message: String,
    },

    /// YAML parsing failed
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime execution error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl MonitorError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Configuration(msg.into())
    }
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
