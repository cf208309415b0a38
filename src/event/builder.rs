use super::LogEvent;
use chrono::{DateTime, Utc};

/// Builder for creating test and synthetic events
pub struct EventBuilder {
    client: String,
    user: String,
    occurred_at: Option<DateTime<Utc>>,
    method: String,
    path: String,
    status: u16,
    size: u64,
}

impl EventBuilder {
    /// Create a new EventBuilder
    pub fn new() -> Self {
        Self {
            client: "127.0.0.1".to_string(),
            user: "-".to_string(),
            occurred_at: None,
            method: "GET".to_string(),
            path: "/".to_string(),
            status: 200,
            size: 0,
        }
    }

    /// Set the client address
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Set the authenticated user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the timestamp for the event
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.occurred_at = Some(timestamp);
        self
    }

    /// Set the HTTP method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the request path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set the response size
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Build the LogEvent
    pub fn build(self) -> LogEvent {
        LogEvent {
            client: self.client,
            user: self.user,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            method: self.method,
            path: self.path,
            status: self.status,
            size: self.size,
        }
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}
