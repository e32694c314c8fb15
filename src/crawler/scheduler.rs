//! Folder fetch pacing
//!
//! Successive folder listing fetches are kept at least `folder-delay-ms`
//! apart. Document downloads inside a folder are not paced.

use crate::config::CrawlerConfig;
use std::time::{Duration, Instant};

/// Paces folder listing fetches against one site
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Minimum time between two folder fetches
    delay: Duration,

    /// When the previous folder fetch was let through
    last_folder_fetch: Option<Instant>,
}

impl Scheduler {
    /// Creates a scheduler with an explicit delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_folder_fetch: None,
        }
    }

    /// Creates a scheduler from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(Duration::from_millis(config.folder_delay_ms))
    }

    /// Calculates the time until the next folder fetch may start
    ///
    /// Returns None if a fetch can start now.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        let last = self.last_folder_fetch?;
        let elapsed = now.duration_since(last);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a folder fetch started at `now`
    pub fn record_fetch(&mut self, now: Instant) {
        self.last_folder_fetch = Some(now);
    }

    /// Waits until a folder fetch may start, then records it
    pub async fn wait_for_folder_slot(&mut self) {
        if let Some(wait) = self.time_until_next(Instant::now()) {
            tracing::debug!("Waiting {}ms before next folder", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
        self.record_fetch(Instant::now());
    }
}
