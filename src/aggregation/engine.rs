use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::alert::{self, AlertState, AlertTransition};
use super::config::AggregationConfig;
use super::sliding_window::RollingHistory;
use super::window::{WindowAccumulator, WindowAggregate};
use crate::error::Result;
use crate::event::LogEvent;
use crate::sink::Notification;

/// Cloneable handle that credits events into the engine's open window
///
/// Every credit happens under the same lock that [`AggregationEngine::flush`]
/// takes to swap the open window, so each event lands in exactly one window.
#[derive(Debug, Clone)]
pub struct Ingestor {
    open: Arc<Mutex<WindowAccumulator>>,
}

impl Ingestor {
    /// Credit one event to the open window
    pub fn ingest(&self, event: &LogEvent) {
        self.ingest_path(&event.path);
    }

    /// Credit a bare request path to the open window
    pub fn ingest_path(&self, path: &str) {
        self.open.lock().credit(path);
    }

    /// Hits credited to the open window so far
    pub fn pending_total(&self) -> u64 {
        self.open.lock().total()
    }
}

/// Result of closing one window
#[derive(Debug, Clone)]
pub struct FlushOutcome {
    /// The closed window with its rolling statistics
    pub aggregate: Arc<WindowAggregate>,
    /// Alert state change caused by this window, if any
    pub transition: Option<AlertTransition>,
}

impl FlushOutcome {
    /// Notifications for this flush, alert change first
    pub fn notifications(&self) -> Vec<Notification> {
        let mut out = Vec::with_capacity(2);
        match self.transition {
            Some(AlertTransition::Triggered) => {
                out.push(Notification::AlertTriggered(self.aggregate.clone()))
            }
            Some(AlertTransition::Recovered) => {
                out.push(Notification::AlertRecovered(self.aggregate.clone()))
            }
            None => {}
        }
        out.push(Notification::AggregateClosed(self.aggregate.clone()));
        out
    }
}

/// Windowed aggregation engine
///
/// Owns the open window, the rolling history and the alert state. Ingestion
/// goes through [`Ingestor`] handles which may be shared across tasks;
/// closing a window requires `&mut self`, so there is only ever one flusher.
#[derive(Debug)]
pub struct AggregationEngine {
    config: AggregationConfig,
    open: Arc<Mutex<WindowAccumulator>>,
    history: RollingHistory,
    state: AlertState,
}

impl AggregationEngine {
    /// Create an engine, rejecting invalid configuration
    pub fn new(config: AggregationConfig) -> Result<Self> {
        config.validate()?;
        let lookback = config.lookback();
        debug!(
            window = ?config.window,
            rolling_window = ?config.rolling_window,
            threshold = config.rate_threshold,
            lookback,
            "Aggregation engine created"
        );
        Ok(Self {
            config,
            open: Arc::new(Mutex::new(WindowAccumulator::new())),
            history: RollingHistory::new(lookback),
            state: AlertState::Normal,
        })
    }

    /// Handle for crediting events from other tasks
    pub fn ingestor(&self) -> Ingestor {
        Ingestor {
            open: Arc::clone(&self.open),
        }
    }

    /// Credit one event to the open window
    pub fn ingest(&self, event: &LogEvent) {
        self.open.lock().credit(&event.path);
    }

    /// Close the open window now
    pub fn flush(&mut self) -> FlushOutcome {
        self.flush_at(Utc::now())
    }

    /// Close the open window, stamping it with `at`
    pub fn flush_at(&mut self, at: DateTime<Utc>) -> FlushOutcome {
        let closed = {
            let mut open = self.open.lock();
            mem::take(&mut *open)
        };

        let mut aggregate = closed.close(at);
        aggregate.rolling_total = self.history.rolling_total_with(aggregate.total);
        aggregate.rolling_average_rate = self.config.average_rate(aggregate.rolling_total);

        let aggregate = Arc::new(aggregate);
        self.history.push(Arc::clone(&aggregate));

        let (next, transition) = alert::evaluate(
            self.state,
            aggregate.rolling_average_rate,
            self.config.rate_threshold,
        );
        self.state = next;

        debug!(
            total = aggregate.total,
            rolling_total = aggregate.rolling_total,
            rate = aggregate.rolling_average_rate,
            "Window closed"
        );
        match transition {
            Some(AlertTransition::Triggered) => warn!(
                rolling_total = aggregate.rolling_total,
                rate = aggregate.rolling_average_rate,
                threshold = self.config.rate_threshold,
                "High traffic alert triggered"
            ),
            Some(AlertTransition::Recovered) => info!(
                rolling_total = aggregate.rolling_total,
                rate = aggregate.rolling_average_rate,
                "Traffic back to normal"
            ),
            None => {}
        }

        FlushOutcome {
            aggregate,
            transition,
        }
    }

    /// Current alert state
    pub fn alert_state(&self) -> AlertState {
        self.state
    }

    /// Closed windows still inside the rolling window
    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    /// Engine configuration
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Number of windows in the rolling window (*W*)
    pub fn lookback(&self) -> usize {
        self.history.capacity()
    }
}
