//! Windowed traffic aggregation
//!
//! Events are credited into an open window; on every scheduler tick the window
//! is closed into a [`WindowAggregate`], rolling statistics are computed over
//! the last *W* closed windows, and the alert machine is evaluated.

/// Section prefixes credited per request path
pub mod hierarchy;
/// Open window accumulator and closed window snapshot
pub mod window;
/// Bounded history of closed windows
pub mod sliding_window;
/// Alert state machine
pub mod alert;
/// Configuration types for aggregation
pub mod config;
/// Aggregation engine and ingestion handle
pub mod engine;

pub use alert::{evaluate, AlertState, AlertTransition};
pub use config::{AggregationConfig, AggregationConfigBuilder};
pub use engine::{AggregationEngine, FlushOutcome, Ingestor};
pub use hierarchy::{sections, Sections, ROOT_SECTION};
pub use sliding_window::RollingHistory;
pub use window::{WindowAccumulator, WindowAggregate};
