//! State module for tracking crawl progress
//!
//! This module provides the data model of a subdomain crawl.
//!
//! # Components
//!
//! - `ItemRef`: A folder or document found on a listing page
//! - `DownloadRecord`: The outcome of processing one document
//! - `CrawlCheckpoint`: Frontier, visited log and records, saved after every folder
//! - `CrawlPhase`: Where a subdomain crawl stands

mod checkpoint;
mod crawl_phase;
mod items;

pub use checkpoint::{CrawlCheckpoint, FolderOutcome};
pub use crawl_phase::CrawlPhase;
pub use items::{DocumentRef, DownloadRecord, FolderRef, ItemRef, ItemRole, RecordSet};
