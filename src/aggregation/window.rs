use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hierarchy::{sections, ROOT_SECTION};

/// Snapshot of one closed window
///
/// `section_counts` always holds the root section, and its count equals
/// `total`. The rolling fields cover the last *W* closed windows, this one
/// included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    /// When the window was closed
    pub occurred_at: DateTime<Utc>,
    /// Hits per section within this window only
    pub section_counts: BTreeMap<String, u64>,
    /// Hits in this window (the root count)
    pub total: u64,
    /// Hits across the rolling window
    pub rolling_total: u64,
    /// Requests per second across the rolling window
    pub rolling_average_rate: f64,
}

impl WindowAggregate {
    /// Hits credited to `section` in this window
    pub fn count(&self, section: &str) -> u64 {
        self.section_counts.get(section).copied().unwrap_or(0)
    }

    /// Sections with at least one hit, busiest first
    ///
    /// Ties are broken by shorter key first, then lexically, so parents sort
    /// ahead of equally busy children.
    pub fn busiest_sections(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .section_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(section, count)| (section.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.len().cmp(&b.0.len()))
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }
}

/// The open window currently receiving events
#[derive(Debug, Clone)]
pub struct WindowAccumulator {
    section_counts: BTreeMap<String, u64>,
}

impl WindowAccumulator {
    /// Create an empty accumulator with the root pre-seeded at zero
    pub fn new() -> Self {
        let mut section_counts = BTreeMap::new();
        section_counts.insert(ROOT_SECTION.to_string(), 0);
        Self { section_counts }
    }

    /// Credit one event on `path`: the root once, then every section prefix once
    pub fn credit(&mut self, path: &str) {
        *self
            .section_counts
            .entry(ROOT_SECTION.to_string())
            .or_insert(0) += 1;

        for section in sections(path) {
            match self.section_counts.get_mut(section) {
                Some(count) => *count += 1,
                None => {
                    self.section_counts.insert(section.to_string(), 1);
                }
            }
        }
    }

    /// Hits credited to the root so far
    pub fn total(&self) -> u64 {
        self.section_counts.get(ROOT_SECTION).copied().unwrap_or(0)
    }

    /// Hits credited to `section` so far
    pub fn count(&self, section: &str) -> u64 {
        self.section_counts.get(section).copied().unwrap_or(0)
    }

    /// Close the window, producing an aggregate without rolling statistics
    pub(crate) fn close(self, occurred_at: DateTime<Utc>) -> WindowAggregate {
        let total = self.total();
        WindowAggregate {
            occurred_at,
            section_counts: self.section_counts,
            total,
            rolling_total: total,
            rolling_average_rate: 0.0,
        }
    }
}

impl Default for WindowAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
