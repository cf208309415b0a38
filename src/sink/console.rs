//! Console reporting of windows and alerts

use std::io::{self, Write};

use async_trait::async_trait;
use clap::ValueEnum;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use yansi::Paint;

use super::{Notification, NotificationSink};
use crate::aggregation::WindowAggregate;
use crate::error::Result;

const SEPARATOR: &str = "--------------------------------------------------";

/// Output format for console reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable status blocks
    #[default]
    Human,
    /// One JSON object per notification
    Json,
}

/// Render a notification as text, without a trailing newline
pub fn render(notification: &Notification, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(notification)?),
        OutputFormat::Human => Ok(render_human(notification, color)),
    }
}

fn render_human(notification: &Notification, color: bool) -> String {
    match notification {
        Notification::AlertTriggered(agg) => {
            let line = format!(
                "High traffic generated an alert - hits = {}, triggered at {}",
                agg.rolling_total, agg.occurred_at
            );
            if color {
                line.red().bold().to_string()
            } else {
                line
            }
        }
        Notification::AlertRecovered(agg) => {
            let line = format!(
                "Traffic back to normal - hits = {} at {}",
                agg.rolling_total, agg.occurred_at
            );
            if color {
                line.green().bold().to_string()
            } else {
                line
            }
        }
        Notification::AggregateClosed(agg) => render_status(agg),
    }
}

fn render_status(agg: &WindowAggregate) -> String {
    let mut out = format!(
        "Status Update - hits = {} at {}\n",
        agg.rolling_total, agg.occurred_at
    );
    for (section, count) in agg.busiest_sections() {
        out.push_str(&format!("{} : {}\n", section, count));
    }
    out.push_str(SEPARATOR);
    out
}

/// Sink that writes reports to stdout or any writer
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
    color: bool,
}

impl ConsoleSink {
    /// Write to standard output
    pub fn stdout(format: OutputFormat, color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), format, color)
    }

    /// Write to an arbitrary writer
    pub fn with_writer(writer: Box<dyn Write + Send>, format: OutputFormat, color: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
            color,
        }
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let text = render(notification, self.format, self.color)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", text)?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
