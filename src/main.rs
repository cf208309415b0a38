//! Command-line interface for logwatch
//!
//! Monitors an access log for traffic spikes, writes synthetic traffic, or
//! does both at once for a demo.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logwatch_rs::{
    init_tracing, ConsoleSink, LogGenerator, LogReader, MonitorBuilder, OutputFormat, Settings,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// HTTP access-log traffic monitor
#[derive(Parser, Debug)]
#[command(name = "logwatch")]
#[command(version = logwatch_rs::VERSION)]
#[command(about = "Watch an access log and alert on sustained high traffic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// YAML settings file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Report window in seconds
    #[arg(long, global = true)]
    window_secs: Option<u64>,

    /// Rolling alert window in seconds
    #[arg(long, global = true)]
    rolling_secs: Option<u64>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Close the partial window when shutting down
    #[arg(long, global = true)]
    flush_on_shutdown: bool,

    /// Disable coloured alert lines
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable JSON structured logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor a log file and print reports
    Read {
        /// Access log to monitor
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Alert threshold in requests per second
        #[arg(short, long)]
        lps: Option<f64>,
        /// Read the file once instead of following it
        #[arg(long)]
        no_follow: bool,
        /// Skip lines already in the file
        #[arg(long)]
        from_end: bool,
    },
    /// Append synthetic traffic to a log file
    Write {
        /// Access log to append to
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Maximum delay between lines in milliseconds
        #[arg(short, long, default_value = "1000")]
        delay: u64,
    },
    /// Write synthetic traffic and monitor it
    Demo {
        /// Access log to use
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Maximum delay between lines in milliseconds
        #[arg(short, long, default_value = "100")]
        delay: u64,
        /// Alert threshold in requests per second
        #[arg(short, long)]
        lps: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::from_yaml_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    apply_overrides(&mut settings, &cli);

    init_tracing(&settings.logging.level, settings.logging.json);

    // Set up graceful shutdown
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                shutdown.cancel();
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    });

    match cli.command {
        Command::Read {
            file,
            lps,
            no_follow,
            from_end,
        } => {
            if let Some(lps) = lps {
                settings.aggregation.rate_threshold = lps;
            }
            if no_follow {
                settings.source.follow = false;
            }
            if from_end {
                settings.source.start_at_end = true;
            }
            monitor_file(&file, &settings, cancel).await?;
        }
        Command::Write { file, delay } => {
            let written = LogGenerator::new(&file, Duration::from_millis(delay))
                .run(cancel)
                .await
                .context("Log generator failed")?;
            info!(written, "Finished writing");
        }
        Command::Demo { file, delay, lps } => {
            if let Some(lps) = lps {
                settings.aggregation.rate_threshold = lps;
            }
            settings.source.follow = true;

            // The reader needs the file to exist before the generator writes to it
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file)
                .await
                .with_context(|| format!("Failed to create {}", file.display()))?;

            let generator = tokio::spawn(
                LogGenerator::new(&file, Duration::from_millis(delay)).run(cancel.clone()),
            );
            monitor_file(&file, &settings, cancel.clone()).await?;
            cancel.cancel();
            let written = generator.await.context("Log generator task failed")??;
            info!(written, "Demo finished");
        }
    }

    Ok(())
}

/// Fold command-line flags into the loaded settings
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(secs) = cli.window_secs {
        settings.aggregation.window_secs = secs;
    }
    if let Some(secs) = cli.rolling_secs {
        settings.aggregation.rolling_window_secs = secs;
    }
    if cli.json {
        settings.output.format = OutputFormat::Json;
    }
    if cli.no_color || !std::io::stdout().is_terminal() {
        settings.output.color = false;
    }
    if cli.flush_on_shutdown {
        settings.output.flush_on_shutdown = true;
    }
    if cli.json_logs {
        settings.logging.json = true;
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
}

/// Monitor `path` until cancelled
async fn monitor_file(path: &Path, settings: &Settings, cancel: CancellationToken) -> Result<()> {
    let monitor = MonitorBuilder::from_settings(settings)
        .context("Invalid monitor configuration")?
        .sink(Arc::new(ConsoleSink::stdout(
            settings.output.format,
            settings.output.color,
        )))
        .build()?;

    let mut reader = LogReader::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if settings.source.start_at_end {
        reader = reader.start_at_end().await?;
    }
    let reader = reader
        .follow(settings.source.follow)
        .poll_interval(settings.source.poll_interval());
    let source_stats = reader.stats();

    let events = reader.into_stream(cancel.clone());
    let report = monitor.run(events, cancel).await?;

    info!(
        lines = source_stats.lines_read(),
        malformed = source_stats.lines_malformed(),
        events = report.events_ingested,
        windows = report.windows_flushed,
        alerts = report.alerts_triggered,
        recoveries = report.alerts_recovered,
        delivery_failures = report.delivery_failures,
        final_state = ?report.final_state,
        "Monitoring finished"
    );
    Ok(())
}
