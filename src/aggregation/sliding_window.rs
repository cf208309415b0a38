use std::collections::VecDeque;
use std::sync::Arc;

use super::window::WindowAggregate;

/// Bounded history of closed windows used for rolling statistics
///
/// Holds at most `capacity` windows (the lookback count *W*); pushing onto a
/// full history evicts the oldest window. The running sum of window totals is
/// maintained on every push and eviction.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    /// Maximum number of windows retained
    capacity: usize,
    /// Closed windows, oldest first
    entries: VecDeque<Arc<WindowAggregate>>,
    /// Sum of `total` over `entries`
    running_total: u64,
}

impl RollingHistory {
    /// Create a history retaining at most `capacity` windows (minimum one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            running_total: 0,
        }
    }

    /// Sum of the retained totals plus `pending`, as if `pending` were pushed
    ///
    /// Used to compute a closing window's rolling total before it is stored.
    pub fn rolling_total_with(&self, pending: u64) -> u64 {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.front().map(|e| e.total).unwrap_or(0)
        } else {
            0
        };
        self.running_total - evicted + pending
    }

    /// Append a closed window, evicting the oldest when full
    pub fn push(&mut self, aggregate: Arc<WindowAggregate>) {
        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                self.running_total -= evicted.total;
            }
        }
        self.running_total += aggregate.total;
        self.entries.push_back(aggregate);
    }

    /// Sum of totals across the retained windows
    pub fn rolling_total(&self) -> u64 {
        self.running_total
    }

    /// Most recently closed window
    pub fn latest(&self) -> Option<&Arc<WindowAggregate>> {
        self.entries.back()
    }

    /// Retained windows, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<WindowAggregate>> {
        self.entries.iter()
    }

    /// Get the number of windows currently retained
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of windows retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

}
