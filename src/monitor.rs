//! Concurrent ingestion and flush pipeline
//!
//! [`Monitor::run`] drives two paths at once: an ingestion task that credits
//! every event from the input stream into the open window, and the flush loop
//! that closes a window on every scheduler tick and hands the notifications to
//! the sinks. The input stream ending does not end the run; empty windows keep
//! closing until the cancellation token fires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregation::{
    AggregationConfig, AggregationEngine, AlertState, AlertTransition, FlushOutcome, Ingestor,
};
use crate::error::{MonitorError, Result};
use crate::event::LogEvent;
use crate::scheduler::FlushScheduler;
use crate::sink::SinkSet;

/// Counters for a running monitor
#[derive(Debug, Default)]
pub struct MonitorStats {
    events_ingested: AtomicU64,
    windows_flushed: AtomicU64,
    alerts_triggered: AtomicU64,
    alerts_recovered: AtomicU64,
    delivery_failures: AtomicU64,
}

impl MonitorStats {
    /// Events credited to a window
    pub fn events_ingested(&self) -> u64 {
        self.events_ingested.load(Ordering::Relaxed)
    }

    /// Windows closed
    pub fn windows_flushed(&self) -> u64 {
        self.windows_flushed.load(Ordering::Relaxed)
    }

    /// Alerts raised
    pub fn alerts_triggered(&self) -> u64 {
        self.alerts_triggered.load(Ordering::Relaxed)
    }

    /// Recoveries reported
    pub fn alerts_recovered(&self) -> u64 {
        self.alerts_recovered.load(Ordering::Relaxed)
    }

    /// Notifications a sink failed to accept
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }
}

/// Summary returned when a monitor run ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    /// Events credited to a window
    pub events_ingested: u64,
    /// Windows closed
    pub windows_flushed: u64,
    /// Alerts raised
    pub alerts_triggered: u64,
    /// Recoveries reported
    pub alerts_recovered: u64,
    /// Notifications a sink failed to accept
    pub delivery_failures: u64,
    /// Alert state at shutdown
    pub final_state: AlertState,
}

/// Aggregation engine wired to a scheduler and notification sinks
#[derive(Debug)]
pub struct Monitor {
    engine: AggregationEngine,
    sinks: SinkSet,
    flush_on_shutdown: bool,
    stats: Arc<MonitorStats>,
}

impl Monitor {
    /// Create a monitor, rejecting invalid configuration
    pub fn new(config: AggregationConfig, sinks: SinkSet) -> Result<Self> {
        Ok(Self {
            engine: AggregationEngine::new(config)?,
            sinks,
            flush_on_shutdown: false,
            stats: Arc::new(MonitorStats::default()),
        })
    }

    /// Close the partial window once more when shutting down
    pub fn flush_on_shutdown(mut self, flush: bool) -> Self {
        self.flush_on_shutdown = flush;
        self
    }

    /// Shared counters for this monitor
    pub fn stats(&self) -> Arc<MonitorStats> {
        Arc::clone(&self.stats)
    }

    /// Handle for crediting events from outside the input stream
    pub fn ingestor(&self) -> Ingestor {
        self.engine.ingestor()
    }

    /// Run until `cancel` fires
    ///
    /// Both the ingestion task and the flush loop observe `cancel`, so the run
    /// returns within one tick of cancellation.
    pub async fn run<S>(mut self, events: S, cancel: CancellationToken) -> Result<MonitorReport>
    where
        S: Stream<Item = LogEvent> + Send + Unpin + 'static,
    {
        let window = self.engine.config().window;
        info!(
            window = ?window,
            rolling_window = ?self.engine.config().rolling_window,
            threshold = self.engine.config().rate_threshold,
            sinks = self.sinks.len(),
            "Monitor started"
        );
        let started = Instant::now();

        let ingest_task = tokio::spawn(ingest(
            events,
            self.engine.ingestor(),
            Arc::clone(&self.stats),
            cancel.clone(),
        ));

        let mut scheduler = FlushScheduler::new(window);
        while scheduler.tick(&cancel).await.is_some() {
            self.flush_once().await;
        }

        info!("Shutdown requested, stopping monitor");
        ingest_task
            .await
            .map_err(|e| MonitorError::Runtime(format!("ingestion task failed: {e}")))?;

        if self.flush_on_shutdown {
            debug!("Flushing partial window on shutdown");
            self.flush_once().await;
        }

        let report = MonitorReport {
            events_ingested: self.stats.events_ingested(),
            windows_flushed: self.stats.windows_flushed(),
            alerts_triggered: self.stats.alerts_triggered(),
            alerts_recovered: self.stats.alerts_recovered(),
            delivery_failures: self.stats.delivery_failures(),
            final_state: self.engine.alert_state(),
        };
        info!(
            events = report.events_ingested,
            windows = report.windows_flushed,
            delivery_failures = report.delivery_failures,
            elapsed = ?started.elapsed(),
            "Monitor stopped"
        );
        Ok(report)
    }

    /// Close one window and deliver its notifications
    async fn flush_once(&mut self) -> FlushOutcome {
        let outcome = self.engine.flush();
        self.stats.windows_flushed.fetch_add(1, Ordering::Relaxed);
        match outcome.transition {
            Some(AlertTransition::Triggered) => {
                self.stats.alerts_triggered.fetch_add(1, Ordering::Relaxed);
            }
            Some(AlertTransition::Recovered) => {
                self.stats.alerts_recovered.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }

        let failures = self.sinks.dispatch(&outcome.notifications()).await;
        if failures > 0 {
            self.stats
                .delivery_failures
                .fetch_add(failures as u64, Ordering::Relaxed);
        }
        outcome
    }
}

/// Credit events from `events` until the stream ends or `cancel` fires
async fn ingest<S>(
    mut events: S,
    ingestor: Ingestor,
    stats: Arc<MonitorStats>,
    cancel: CancellationToken,
) where
    S: Stream<Item = LogEvent> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = events.next() => next,
        };
        match next {
            Some(event) => {
                ingestor.ingest(&event);
                stats.events_ingested.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                debug!("Event stream ended, windows keep closing until shutdown");
                break;
            }
        }
    }
}
