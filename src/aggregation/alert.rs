//! Two-state alert machine with hysteresis
//!
//! Evaluated once per closed window against the rolling average rate. A rate
//! strictly above the threshold triggers; a rate at or below it recovers. A
//! rate exactly equal to the threshold is therefore always normal.

use serde::{Deserialize, Serialize};

/// Current alert state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Traffic is at or below the threshold
    #[default]
    Normal,
    /// Traffic has exceeded the threshold and not yet recovered
    Triggered,
}

/// A change of alert state emitted by [`evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTransition {
    /// Normal to Triggered
    Triggered,
    /// Triggered to Normal
    Recovered,
}

impl AlertState {
    /// Whether an alert is currently active
    pub fn is_triggered(self) -> bool {
        matches!(self, AlertState::Triggered)
    }
}

/// Decide the next state for a rolling average `rate` against `threshold`
pub fn evaluate(
    state: AlertState,
    rate: f64,
    threshold: f64,
) -> (AlertState, Option<AlertTransition>) {
    match state {
        AlertState::Normal if rate > threshold => {
            (AlertState::Triggered, Some(AlertTransition::Triggered))
        }
        AlertState::Triggered if rate <= threshold => {
            (AlertState::Normal, Some(AlertTransition::Recovered))
        }
        _ => (state, None),
    }
}
