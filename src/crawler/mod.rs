//! Crawler module for document center traversal
//!
//! This module contains the core crawling logic, including:
//! - Cached HTTP fetching
//! - Listing page parsing
//! - File type resolution and document downloads
//! - Folder fetch pacing
//! - Breadth-first crawl coordination per subdomain

mod coordinator;
mod downloader;
mod fetcher;
mod filetype;
mod parser;
mod scheduler;

pub use coordinator::{CrawlOutcome, SiteCrawler};
pub use downloader::{sanitize_segment, DocumentDownloader, SCRAPED_AT_FORMAT};
pub use fetcher::{build_http_client, FetchError, PageFetcher, PageSnapshot};
pub use filetype::{resolve_file_type, ResolutionError, ResolvedType};
pub use parser::{extract_items, parse_listing, resolve_link, Listing};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::output::RunSummary;
use crate::storage::{open_response_cache, CrawlStateStore, FileStateStore};
use crate::url::validate_subdomain;
use crate::{ConfigError, HarvestError, UrlError};
use std::path::Path;

/// Per-run choices layered on top of the configuration
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Subdomains to crawl; empty means every configured subdomain
    pub subdomains: Vec<String>,

    /// Discard existing checkpoints before crawling
    pub fresh: bool,

    /// Requeue failed folders (in addition to the config setting)
    pub retry_failed: bool,

    /// Crawl subdomains the registry already marks complete
    pub include_complete: bool,

    /// Stop each subdomain after this many folders
    pub max_folders: Option<usize>,
}

/// Subdomains a run handles, in config order
///
/// Names given on the command line that are not in the config are appended
/// after checking they are valid DNS labels.
pub fn select_subdomains(config: &Config, requested: &[String]) -> Result<Vec<String>, UrlError> {
    let configured = config.subdomains.iter().map(|s| s.name.clone());

    if requested.is_empty() {
        return Ok(configured.collect());
    }

    let mut selected: Vec<String> = configured.filter(|name| requested.contains(name)).collect();
    for name in requested {
        if !selected.contains(name) {
            validate_subdomain(name)?;
            selected.push(name.clone());
        }
    }
    Ok(selected)
}

/// Builds a site crawler from the configuration
pub fn build_crawler(config: &Config) -> Result<SiteCrawler<FileStateStore>, HarvestError> {
    let client = build_http_client(&config.user_agent.header, &config.crawler)?;
    let cache = open_response_cache(Path::new(&config.output.cache_path))?;
    let ttl = i64::try_from(config.crawler.cache_ttl_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| {
            ConfigError::Validation(format!(
                "cache_ttl_secs out of range: {}",
                config.crawler.cache_ttl_secs
            ))
        })?;
    let fetcher = PageFetcher::new(client, cache, ttl);

    let store = FileStateStore::open(Path::new(&config.output.state_dir))?;
    let downloader = DocumentDownloader::new(&config.output.documents_root);

    Ok(SiteCrawler::new(
        config.crawler.clone(),
        fetcher,
        downloader,
        store,
    ))
}

/// Runs a complete harvest
///
/// This is the main entry point for a run. For each selected subdomain, in
/// order, it will:
/// 1. Skip it if the registry marks it complete (unless asked not to)
/// 2. Reset its checkpoint when starting fresh
/// 3. Crawl it to completion or until the folder budget runs out
/// 4. Record the outcome in the registry and the run summary
///
/// A subdomain whose crawl fails is logged and listed as failed in the
/// summary, and the run moves on to the next one.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `options` - Per-run options from the command line
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every selected subdomain was handled
/// * `Err(HarvestError)` - Setup failed or a requested subdomain is invalid
pub async fn run_harvest(
    config: &Config,
    options: &HarvestOptions,
) -> Result<RunSummary, HarvestError> {
    let subdomains = select_subdomains(config, &options.subdomains)?;
    let mut crawler = build_crawler(config)?
        .with_retry_failed(options.retry_failed || config.crawler.retry_failed_folders)
        .with_folder_budget(options.max_folders);

    let registry = crawler.store().load_registry()?;
    let mut summary = RunSummary::new();

    for subdomain in subdomains {
        if options.fresh {
            tracing::info!("Discarding checkpoint of {}", subdomain);
            if let Err(e) = crawler.store_mut().reset(&subdomain) {
                tracing::error!("Could not reset {}: {}", subdomain, e);
                summary.record_failed(&subdomain, e);
                continue;
            }
        } else if !options.include_complete
            && registry.get(&subdomain).is_some_and(|entry| entry.complete)
        {
            tracing::info!("Skipping {}: already complete", subdomain);
            summary.record_skipped(&subdomain);
            continue;
        }

        match crawler.crawl(&subdomain).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", subdomain, e);
                summary.record_failed(&subdomain, e);
            }
        }
    }

    Ok(summary)
}
