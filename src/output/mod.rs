//! Output module for run summaries and statistics
//!
//! This module handles:
//! - Collecting per-subdomain crawl outcomes into a run summary
//! - Rendering the summary table printed at the end of a run
//! - Registry statistics for `--stats`

mod stats;
mod summary;

pub use stats::{print_statistics, RegistryStatistics};
pub use summary::RunSummary;
