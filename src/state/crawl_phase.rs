/// Crawl phase definitions for one subdomain
///
/// This module defines the states a subdomain crawl moves through.
use std::fmt;

/// Represents where a subdomain crawl stands
///
/// `Idle -> Running -> Suspended | Completed`. There is no failed state:
/// folder and document failures are absorbed, and only an empty frontier
/// completes a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Crawler constructed, checkpoint not yet loaded
    Idle,

    /// Folders are being dequeued and processed
    Running,

    /// Stopped with folders still in the frontier
    Suspended,

    /// Frontier exhausted
    Completed,
}

impl CrawlPhase {
    /// Phase a stopped crawl ends in, given whether folders remain
    pub fn after_stop(frontier_empty: bool) -> Self {
        if frontier_empty {
            Self::Completed
        } else {
            Self::Suspended
        }
    }

    /// Converts the phase to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
