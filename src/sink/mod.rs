//! Notification delivery
//!
//! Every flush produces up to two [`Notification`]s: an alert change (if any)
//! followed by the closed aggregate. A [`SinkSet`] delivers them in that order
//! to each registered [`NotificationSink`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::error;

use crate::aggregation::WindowAggregate;
use crate::error::Result;

pub mod channel;
pub mod console;

pub use channel::ChannelSink;
pub use console::{ConsoleSink, OutputFormat};

/// Signal emitted by a flush
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "aggregate", rename_all = "snake_case")]
pub enum Notification {
    /// Rolling rate rose above the threshold
    AlertTriggered(Arc<WindowAggregate>),
    /// Rolling rate fell back to or below the threshold
    AlertRecovered(Arc<WindowAggregate>),
    /// A window was closed
    AggregateClosed(Arc<WindowAggregate>),
}

impl Notification {
    /// The aggregate carried by this notification
    pub fn aggregate(&self) -> &Arc<WindowAggregate> {
        match self {
            Notification::AlertTriggered(agg)
            | Notification::AlertRecovered(agg)
            | Notification::AggregateClosed(agg) => agg,
        }
    }

    /// Whether this is an alert change rather than a window report
    pub fn is_alert(&self) -> bool {
        !matches!(self, Notification::AggregateClosed(_))
    }
}

/// Receiver of flush notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, notification: &Notification) -> Result<()>;

    /// Get sink name for logging
    fn name(&self) -> &str {
        "sink"
    }
}

/// Ordered fan-out to several sinks
#[derive(Clone, Default)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl SinkSet {
    /// Create an empty sink set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink
    pub fn add(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Register a sink, builder style
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.add(sink);
        self
    }

    /// Number of registered sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are registered
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver notifications in order to every sink
    ///
    /// A failing sink is logged and skipped; it does not prevent delivery to
    /// the other sinks. Returns the number of failed deliveries.
    pub async fn dispatch(&self, notifications: &[Notification]) -> usize {
        let mut failures = 0;
        for notification in notifications {
            for sink in &self.sinks {
                if let Err(e) = sink.notify(notification).await {
                    failures += 1;
                    error!(sink = sink.name(), error = %e, "Notification delivery failed");
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::WindowAccumulator;
    use crate::error::MonitorError;
    use chrono::Utc;
    use parking_lot::Mutex;

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn notify(&self, _notification: &Notification) -> Result<()> {
            Err(MonitorError::Notification {
                sink: "failing".to_string(),
                message: "always fails".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.seen.lock().push(notification.clone());
            Ok(())
        }
    }

    fn aggregate() -> Arc<WindowAggregate> {
        Arc::new(WindowAccumulator::new().close(Utc::now()))
    }

    #[tokio::test]
    async fn test_dispatch_survives_failing_sink() {
        let recorder = Arc::new(RecordingSink::default());
        let sinks = SinkSet::new()
            .with(Arc::new(FailingSink))
            .with(recorder.clone());

        let agg = aggregate();
        let notes = vec![
            Notification::AlertRecovered(agg.clone()),
            Notification::AggregateClosed(agg),
        ];
        let failures = sinks.dispatch(&notes).await;

        assert_eq!(failures, 2);
        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_alert());
        assert!(!seen[1].is_alert());
    }

    #[test]
    fn test_notification_serializes_with_kind() {
        let note = Notification::AggregateClosed(aggregate());
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"], "aggregate_closed");
        assert_eq!(json["aggregate"]["total"], 0);
    }
}
