//! Access-log traffic monitor
//!
//! This library tails an HTTP access log, aggregates request counts per path
//! section over fixed windows, and raises an alert when the rolling average
//! request rate stays above a threshold, reporting recovery once it falls back.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use logwatch_rs::{ConsoleSink, LogReader, MonitorBuilder, OutputFormat};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let monitor = MonitorBuilder::new()
//!     .window(Duration::from_secs(10))
//!     .rolling_window(Duration::from_secs(120))
//!     .rate_threshold(10.0)
//!     .sink(Arc::new(ConsoleSink::stdout(OutputFormat::Human, true)))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let events = LogReader::open("/var/log/access.log")
//!     .await?
//!     .follow(true)
//!     .into_stream(cancel.clone());
//!
//! let report = monitor.run(events, cancel).await?;
//! tracing::info!(windows = report.windows_flushed, "done");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

use std::sync::Arc;
use std::time::Duration;

pub use aggregation::{
    AggregationConfig, AggregationEngine, AlertState, AlertTransition, FlushOutcome, Ingestor,
    WindowAggregate,
};
pub use config::Settings;
pub use error::{MonitorError, Result};
pub use event::{EventBuilder, LogEvent};
pub use generator::LogGenerator;
pub use monitor::{Monitor, MonitorReport, MonitorStats};
pub use parser::{parse_line, ParseError};
pub use scheduler::FlushScheduler;
pub use sink::{ChannelSink, ConsoleSink, Notification, NotificationSink, OutputFormat, SinkSet};
pub use source::{LogReader, SourceStats};

/// Error types
pub mod error;

/// Parsed access-log records
pub mod event;

/// Common Log Format parsing
pub mod parser;

/// Windowed aggregation and alerting
pub mod aggregation;

/// Periodic flush timer
pub mod scheduler;

/// Notification sinks
pub mod sink;

/// Log file reading and tailing
pub mod source;

/// Synthetic log generation
pub mod generator;

/// Ingestion and flush pipeline
pub mod monitor;

/// YAML settings
pub mod config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber
///
/// `level` is an `EnvFilter` directive; an invalid directive falls back to
/// `info`. `RUST_LOG`, when set, takes precedence.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Builder for configuring a monitor
#[derive(Debug, Clone, Default)]
pub struct MonitorBuilder {
    /// Aggregation parameters
    pub config: AggregationConfig,
    /// Notification sinks, in delivery order
    pub sinks: SinkSet,
    /// Close the partial window on shutdown
    pub flush_on_shutdown: bool,
}

impl MonitorBuilder {
    /// Create a new builder with default parameters and no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from file settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            config: settings.aggregation_config()?,
            sinks: SinkSet::new(),
            flush_on_shutdown: settings.output.flush_on_shutdown,
        })
    }

    /// Set the window duration
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Set the rolling window duration
    pub fn rolling_window(mut self, rolling_window: Duration) -> Self {
        self.config.rolling_window = rolling_window;
        self
    }

    /// Set the alert threshold in requests per second
    pub fn rate_threshold(mut self, threshold: f64) -> Self {
        self.config.rate_threshold = threshold;
        self
    }

    /// Add a notification sink
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.add(sink);
        self
    }

    /// Set whether to close the partial window on shutdown
    pub fn flush_on_shutdown(mut self, flush: bool) -> Self {
        self.flush_on_shutdown = flush;
        self
    }

    /// Validate the configuration and build the monitor
    pub fn build(self) -> Result<Monitor> {
        Ok(Monitor::new(self.config, self.sinks)?.flush_on_shutdown(self.flush_on_shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = MonitorBuilder::new();
        assert_eq!(builder.config, AggregationConfig::default());
        assert!(builder.sinks.is_empty());
        assert!(!builder.flush_on_shutdown);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_builder_configuration() {
        let (sink, _rx) = ChannelSink::new();
        let builder = MonitorBuilder::new()
            .window(Duration::from_secs(1))
            .rolling_window(Duration::from_secs(5))
            .rate_threshold(2.5)
            .sink(Arc::new(sink))
            .flush_on_shutdown(true);

        assert_eq!(builder.config.window, Duration::from_secs(1));
        assert_eq!(builder.config.rolling_window, Duration::from_secs(5));
        assert_eq!(builder.config.rate_threshold, 2.5);
        assert_eq!(builder.sinks.len(), 1);
        assert!(builder.flush_on_shutdown);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = MonitorBuilder::new()
            .window(Duration::from_secs(60))
            .rolling_window(Duration::from_secs(30))
            .build();
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }

    #[test]
    fn test_builder_from_settings() {
        let settings = Settings::from_yaml_str(
            "aggregation:\n  window_secs: 2\n  rolling_window_secs: 8\noutput:\n  flush_on_shutdown: true\n",
        )
        .unwrap();
        let builder = MonitorBuilder::from_settings(&settings).unwrap();
        assert_eq!(builder.config.lookback(), 4);
        assert!(builder.flush_on_shutdown);
    }
}
