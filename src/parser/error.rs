use thiserror::Error;

/// Errors produced while parsing a single access-log line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not follow the Common Log Format layout
    #[error("line does not match the common log format: {line}")]
    NoMatch {
        /// The offending line, truncated for display
        line: String,
    },

    /// Timestamp field could not be parsed
    #[error("invalid timestamp '{value}': {error}")]
    InvalidTimestamp {
        /// Raw timestamp text
        value: String,
        /// Underlying error
        error: String,
    },

    /// Status code is not a valid number
    #[error("invalid status code '{value}'")]
    InvalidStatus {
        /// Raw status text
        value: String,
    },

    /// Response size is not a valid number
    #[error("invalid response size '{value}'")]
    InvalidSize {
        /// Raw size text
        value: String,
    },
}

/// Longest excerpt of a rejected line kept in an error
const MAX_EXCERPT: usize = 120;

impl ParseError {
    /// Create a no-match error, truncating very long lines
    pub fn no_match(line: &str) -> Self {
        let line = match line.char_indices().nth(MAX_EXCERPT) {
            Some((idx, _)) => format!("{}...", &line[..idx]),
            None => line.to_string(),
        };
        ParseError::NoMatch { line }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(value: impl Into<String>, error: impl Into<String>) -> Self {
        ParseError::InvalidTimestamp {
            value: value.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_truncates() {
        let long = "x".repeat(500);
        match ParseError::no_match(&long) {
            ParseError::NoMatch { line } => {
                assert_eq!(line.len(), MAX_EXCERPT + 3);
                assert!(line.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let err = ParseError::InvalidStatus {
            value: "2x0".to_string(),
        };
        assert_eq!(err.to_string(), "invalid status code '2x0'");
    }
}
