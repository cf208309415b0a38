use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Notification, NotificationSink};
use crate::error::{MonitorError, Result};

/// Sink that forwards notifications into a tokio channel
///
/// Useful for embedding the monitor in another service and for tests that
/// assert on the exact notification sequence.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .map_err(|_| MonitorError::Notification {
                sink: self.name().to_string(),
                message: "receiver dropped".to_string(),
            })
    }

    fn name(&self) -> &str {
        "channel"
    }
}
