//! Access-log source
//!
//! Reads a log file (or any async reader) line by line, parses each line and
//! forwards well-formed events as a stream. Malformed lines are logged and
//! counted but never reach the aggregation engine. In follow mode the reader
//! keeps polling at end of file, like `tail -f`.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::event::LogEvent;
use crate::parser::parse_line;

/// Default delay between polls at end of file
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Buffered events between the reader task and the consumer
const CHANNEL_CAPACITY: usize = 1024;

/// Counters for a running source
#[derive(Debug, Default)]
pub struct SourceStats {
    lines_read: AtomicU64,
    events_emitted: AtomicU64,
    lines_malformed: AtomicU64,
}

impl SourceStats {
    /// Non-blank lines read
    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    /// Events forwarded downstream
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    /// Lines dropped because they failed to parse
    pub fn lines_malformed(&self) -> u64 {
        self.lines_malformed.load(Ordering::Relaxed)
    }
}

/// Reads access-log lines into an event stream
pub struct LogReader<R> {
    reader: R,
    label: String,
    follow: bool,
    poll_interval: Duration,
    stats: Arc<SourceStats>,
}

impl LogReader<BufReader<File>> {
    /// Open a log file for reading from its beginning
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let mut reader = Self::new(BufReader::new(file));
        reader.label = path.display().to_string();
        Ok(reader)
    }

    /// Skip everything already in the file, reading only lines appended later
    pub async fn start_at_end(mut self) -> Result<Self> {
        let offset = self.reader.seek(SeekFrom::End(0)).await?;
        debug!(source = %self.label, offset, "Starting at end of file");
        Ok(self)
    }
}

impl<R> LogReader<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Wrap any buffered async reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            label: "reader".to_string(),
            follow: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stats: Arc::new(SourceStats::default()),
        }
    }

    /// Keep polling for new lines at end of input
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Set the delay between polls at end of input
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shared counters for this source
    pub fn stats(&self) -> Arc<SourceStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn the reading task and return the stream of parsed events
    ///
    /// The stream ends when input is exhausted (without follow), when reading
    /// fails, when `cancel` fires, or when the stream is dropped.
    pub fn into_stream(
        self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = LogEvent> + Send + Unpin {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(self.run(tx, cancel));
        ReceiverStream::new(rx)
    }

    async fn run(mut self, tx: mpsc::Sender<LogEvent>, cancel: CancellationToken) {
        info!(source = %self.label, follow = self.follow, "Log reader started");
        let mut line = Vec::new();

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                read = self.reader.read_until(b'\n', &mut line) => read,
            };

            match read {
                Ok(0) => {
                    if !self.follow {
                        break;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(source = %self.label, error = %e, "Log read failed");
                    break;
                }
            }

            // Hold a partial line until the writer finishes it
            if self.follow && !line.ends_with(b"\n") {
                continue;
            }

            if !forward_line(&self.label, &self.stats, &line, &tx).await {
                break;
            }
            line.clear();
        }

        info!(
            source = %self.label,
            lines = self.stats.lines_read(),
            events = self.stats.events_emitted(),
            malformed = self.stats.lines_malformed(),
            "Log reader stopped"
        );
    }
}

/// Decode, parse and forward one line; returns false once the consumer is gone
async fn forward_line(
    label: &str,
    stats: &SourceStats,
    line: &[u8],
    tx: &mpsc::Sender<LogEvent>,
) -> bool {
    if line.iter().all(u8::is_ascii_whitespace) {
        return true;
    }
    stats.lines_read.fetch_add(1, Ordering::Relaxed);

    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(e) => {
            stats.lines_malformed.fetch_add(1, Ordering::Relaxed);
            warn!(source = %label, error = %e, "Dropping log line that is not valid UTF-8");
            return true;
        }
    };

    match parse_line(line) {
        Ok(event) => {
            if tx.send(event).await.is_err() {
                debug!(source = %label, "Event consumer dropped");
                return false;
            }
            stats.events_emitted.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.lines_malformed.fetch_add(1, Ordering::Relaxed);
            warn!(source = %label, error = %e, "Dropping malformed log line");
        }
    }
    true
}
