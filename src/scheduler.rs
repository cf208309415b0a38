//! Periodic flush timer
//!
//! Ticks once per window regardless of ingestion rate, so empty windows are
//! still closed and reported. A late tick pushes the following ones back
//! rather than firing a burst, so no period is ever shorter than configured.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Drives window closure at a fixed period
#[derive(Debug)]
pub struct FlushScheduler {
    period: Duration,
    interval: Interval,
    ticks: u64,
}

impl FlushScheduler {
    /// Create a scheduler whose first tick fires one full period from now
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            period,
            interval,
            ticks: 0,
        }
    }

    /// Wait for the next tick, or return `None` once `cancel` fires
    pub async fn tick(&mut self, cancel: &CancellationToken) -> Option<Instant> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            at = self.interval.tick() => {
                self.ticks += 1;
                trace!(tick = self.ticks, "Flush tick");
                Some(at)
            }
        }
    }

    /// Configured period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
