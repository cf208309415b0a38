use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Configuration for the aggregation engine
///
/// Fixed at engine construction. The lookback count *W* is
/// `rolling_window / window`, truncated; the rolling average rate divides the
/// rolling total by the whole seconds of `rolling_window` with integer
/// (truncating) division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Length of one accumulation window
    pub window: Duration,
    /// Span the rolling total and average are computed over
    pub rolling_window: Duration,
    /// Requests per second above which an alert triggers
    pub rate_threshold: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),          // report every 10 seconds
            rolling_window: Duration::from_secs(120), // 2 minute alert window
            rate_threshold: 10.0,
        }
    }
}

impl AggregationConfig {
    /// Create a builder starting from the defaults
    pub fn builder() -> AggregationConfigBuilder {
        AggregationConfigBuilder::new()
    }

    /// Check the configuration, rejecting values that cannot be honoured
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(MonitorError::config("window duration must be positive"));
        }
        if self.rolling_window < self.window {
            return Err(MonitorError::config(format!(
                "rolling window {:?} is shorter than window {:?}",
                self.rolling_window, self.window
            )));
        }
        if self.rolling_window.as_secs() == 0 {
            return Err(MonitorError::config(format!(
                "rolling window {:?} must span at least one whole second",
                self.rolling_window
            )));
        }
        if !self.rate_threshold.is_finite() || self.rate_threshold <= 0.0 {
            return Err(MonitorError::config(format!(
                "rate threshold {} must be a positive number",
                self.rate_threshold
            )));
        }
        Ok(())
    }

    /// Number of closed windows that make up the rolling window (*W*)
    pub fn lookback(&self) -> usize {
        let window_ms = self.window.as_millis().max(1);
        let lookback = self.rolling_window.as_millis() / window_ms;
        usize::try_from(lookback).unwrap_or(usize::MAX).max(1)
    }

    /// Whole seconds of the rolling window, the divisor of the average rate
    pub fn rolling_window_secs(&self) -> u64 {
        self.rolling_window.as_secs().max(1)
    }

    /// Rolling average rate for a rolling total, using truncating division
    pub fn average_rate(&self, rolling_total: u64) -> f64 {
        (rolling_total / self.rolling_window_secs()) as f64
    }
}

/// Builder for AggregationConfig
#[derive(Debug, Clone, Default)]
pub struct AggregationConfigBuilder {
    config: AggregationConfig,
}

impl AggregationConfigBuilder {
    /// Create a new aggregation config builder
    pub fn new() -> Self {
        Self {
            config: AggregationConfig::default(),
        }
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

    /// Validate and build the configuration
    pub fn build(self) -> Result<AggregationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AggregationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookback(), 12);
        assert_eq!(config.rolling_window_secs(), 120);
    }

    #[test]
    fn test_builder() {
        let config = AggregationConfig::builder()
            .window(Duration::from_secs(1))
            .rolling_window(Duration::from_secs(2))
            .rate_threshold(1.0)
            .build()
            .unwrap();
        assert_eq!(config.lookback(), 2);
    }

    #[test]
    fn test_lookback_truncates() {
        let config = AggregationConfig::builder()
            .window(Duration::from_secs(3))
            .rolling_window(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(config.lookback(), 3);
    }

    #[test]
    fn test_rejects_short_rolling_window() {
        let result = AggregationConfig::builder()
            .window(Duration::from_secs(10))
            .rolling_window(Duration::from_secs(5))
            .build();
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }

    #[test]
    fn test_rejects_zero_window() {
        let result = AggregationConfig::builder().window(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_sub_second_rolling_window() {
        let result = AggregationConfig::builder()
            .window(Duration::from_millis(100))
            .rolling_window(Duration::from_millis(500))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for threshold in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = AggregationConfig::builder().rate_threshold(threshold).build();
            assert!(result.is_err(), "threshold {threshold} should be rejected");
        }
    }

    #[test]
    fn test_average_rate_truncates() {
        let config = AggregationConfig::builder()
            .window(Duration::from_secs(1))
            .rolling_window(Duration::from_secs(2))
            .build()
            .unwrap();
        assert_eq!(config.average_rate(240), 120.0);
        assert_eq!(config.average_rate(3), 1.0);
        assert_eq!(config.average_rate(1), 0.0);
    }
}
