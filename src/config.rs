//! File-based configuration
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working configuration. Command-line flags are applied on top.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationConfig;
use crate::error::{MonitorError, Result};
use crate::sink::OutputFormat;

/// Top-level settings loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window and alert parameters
    pub aggregation: AggregationSettings,
    /// How the log file is read
    pub source: SourceSettings,
    /// Console reporting
    pub output: OutputSettings,
    /// Diagnostic logging
    pub logging: LoggingSettings,
}

/// Window and alert parameters, in whole seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Length of one accumulation window
    pub window_secs: u64,
    /// Span of the rolling total
    pub rolling_window_secs: u64,
    /// Requests per second above which an alert triggers
    pub rate_threshold: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            window_secs: 10,
            rolling_window_secs: 120,
            rate_threshold: 10.0,
        }
    }
}

/// Log source options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Keep reading as the file grows
    pub follow: bool,
    /// Delay between polls at end of file, in milliseconds
    pub poll_interval_ms: u64,
    /// Skip lines already present when the monitor starts
    pub start_at_end: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            follow: true,
            poll_interval_ms: 250,
            start_at_end: false,
        }
    }
}

impl SourceSettings {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Console reporting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Report format
    pub format: OutputFormat,
    /// Colour alert lines
    pub color: bool,
    /// Close the partial window on shutdown
    pub flush_on_shutdown: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
            flush_on_shutdown: false,
        }
    }
}

/// Diagnostic logging options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `logwatch_rs=debug`
    pub level: String,
    /// Emit JSON log records
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse settings from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validated aggregation configuration
    pub fn aggregation_config(&self) -> Result<AggregationConfig> {
        AggregationConfig::builder()
            .window(Duration::from_secs(self.aggregation.window_secs))
            .rolling_window(Duration::from_secs(self.aggregation.rolling_window_secs))
            .rate_threshold(self.aggregation.rate_threshold)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_yaml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.aggregation_config().unwrap(), AggregationConfig::default());
        assert!(settings.source.follow);
        assert_eq!(settings.source.poll_interval(), Duration::from_millis(250));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_document() {
        let yaml = r#"
aggregation:
  window_secs: 1
  rolling_window_secs: 2
output:
  format: json
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.aggregation.window_secs, 1);
        assert_eq!(settings.aggregation.rate_threshold, 10.0);
        assert_eq!(settings.output.format, OutputFormat::Json);
        assert!(settings.output.color);

        let config = settings.aggregation_config().unwrap();
        assert_eq!(config.lookback(), 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "aggregation:\n  window_secs: 30\n  rolling_window_secs: 10\n";
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            settings.aggregation_config(),
            Err(MonitorError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = Settings::from_yaml_str("aggregation: [1, 2");
        assert!(matches!(result, Err(MonitorError::YamlParse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source:\n  follow: false\n  poll_interval_ms: 50").unwrap();

        let settings = Settings::from_yaml_file(file.path()).unwrap();
        assert!(!settings.source.follow);
        assert_eq!(settings.source.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_missing_file() {
        let result = Settings::from_yaml_file("/nonexistent/logwatch.yaml");
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }
}
