//! Synthetic access-log generator
//!
//! Appends random Common Log Format lines to a file at random intervals, for
//! demos and for exercising the monitor against a live, growing file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::parser::format_timestamp;

const USERS: &[&str] = &[
    "james", "jill", "frank", "chris", "mary", "avery", "bailey", "carson", "drew", "kelsey",
    "lane", "marley",
];
const METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
const PATHS: &[&str] = &[
    "/api/user",
    "/report",
    "/api/post",
    "/api/comment",
    "/admin/portal",
    "/admin/user",
    "/admin/moderate",
];
const STATUSES: &[u16] = &[200, 404, 501];

/// Produce one random access-log line stamped with `now`
pub fn random_line<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    let user = USERS.choose(rng).copied().unwrap_or("-");
    let method = METHODS.choose(rng).copied().unwrap_or("GET");
    let path = PATHS.choose(rng).copied().unwrap_or("/");
    let status = STATUSES.choose(rng).copied().unwrap_or(200);
    let size: u32 = rng.gen_range(0..i32::MAX as u32);
    format!(
        "127.0.0.1 - {} [{}] \"{} {} HTTP/1.0\" {} {}",
        user,
        format_timestamp(&now),
        method,
        path,
        status,
        size
    )
}

/// Writes random lines to a log file until cancelled
#[derive(Debug)]
pub struct LogGenerator {
    path: PathBuf,
    max_delay: Duration,
    rng: StdRng,
}

impl LogGenerator {
    /// Create a generator appending to `path`, pausing up to `max_delay` between lines
    pub fn new(path: impl AsRef<Path>, max_delay: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_delay,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Append lines until `cancel` fires; returns the number of lines written
    pub async fn run(mut self, cancel: CancellationToken) -> Result<u64> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        info!(path = %self.path.display(), max_delay = ?self.max_delay, "Log generator started");

        let mut written = 0u64;
        loop {
            let delay = self.next_delay();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let mut line = random_line(&mut self.rng, Utc::now());
            line.push('\n');
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            written += 1;
            debug!(written, "Generated log line");
        }

        info!(path = %self.path.display(), written, "Log generator stopped");
        Ok(written)
    }

    fn next_delay(&mut self) -> Duration {
        let max_ms = self.max_delay.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    #[test]
    fn test_random_line_parses() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let line = random_line(&mut rng, Utc::now());
            let event = parse_line(&line).unwrap();
            assert!(PATHS.contains(&event.path.as_str()));
            assert!(STATUSES.contains(&event.status));
        }
    }

    #[tokio::test]
    async fn test_generator_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        let cancel = CancellationToken::new();

        let generator = LogGenerator::new(&path, Duration::from_millis(5)).with_seed(1);
        let handle = tokio::spawn(generator.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let written = handle.await.unwrap().unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count() as u64, written);
        assert!(written > 0);
    }
}
