//! Site crawler - breadth-first traversal of one document center
//!
//! This module contains the crawl loop for a subdomain:
//! - Loading the checkpoint, or bootstrapping a new one from the root page
//! - Dequeuing folders in FIFO order and pacing their fetches
//! - Extracting sub-folders and downloading documents
//! - Saving the checkpoint after every folder

use crate::config::CrawlerConfig;
use crate::crawler::downloader::DocumentDownloader;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::parse_listing;
use crate::crawler::scheduler::Scheduler;
use crate::state::{CrawlCheckpoint, CrawlPhase, FolderOutcome, FolderRef, ItemRef};
use crate::storage::{CrawlStateStore, RegistryEntry};
use crate::url::SiteUrls;
use crate::HarvestError;
use url::Url;

/// How a subdomain crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub subdomain: String,

    /// Documents recorded, successful or not
    pub document_count: usize,

    /// Documents whose record carries an error
    pub error_count: usize,

    /// Folders whose listing was processed
    pub folders_visited: usize,

    /// Folders whose listing fetch failed
    pub folders_failed: usize,

    /// Folders still waiting in the frontier
    pub folders_pending: usize,

    /// True once the frontier is exhausted
    pub complete: bool,

    pub phase: CrawlPhase,

    /// Set when the root page could not be fetched for a new crawl
    pub bootstrap_error: Option<String>,
}

impl CrawlOutcome {
    fn from_checkpoint(subdomain: &str, checkpoint: &CrawlCheckpoint, phase: CrawlPhase) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            document_count: checkpoint.document_count(),
            error_count: checkpoint.records.error_count(),
            folders_visited: checkpoint.visited.len(),
            folders_failed: checkpoint.failed.len(),
            folders_pending: checkpoint.frontier.len(),
            complete: checkpoint.is_complete(),
            phase,
            bootstrap_error: None,
        }
    }

    fn bootstrap_failed(subdomain: &str, error: &FetchError) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            document_count: 0,
            error_count: 0,
            folders_visited: 0,
            folders_failed: 0,
            folders_pending: 0,
            complete: false,
            phase: CrawlPhase::Idle,
            bootstrap_error: Some(error.to_string()),
        }
    }

    /// Registry entry recorded for this outcome
    pub fn registry_entry(&self) -> RegistryEntry {
        RegistryEntry {
            document_count: self.document_count,
            complete: self.complete,
        }
    }
}

/// Crawls document centers one subdomain at a time
///
/// The crawler owns the fetcher and the checkpoint store; a single instance
/// is reused across subdomains so they share one HTTP client and cache.
pub struct SiteCrawler<S: CrawlStateStore> {
    config: CrawlerConfig,
    fetcher: PageFetcher,
    downloader: DocumentDownloader,
    store: S,
    scheduler: Scheduler,
    retry_failed: bool,
    folder_budget: Option<usize>,
    phase: CrawlPhase,
}

impl<S: CrawlStateStore> SiteCrawler<S> {
    /// Creates a site crawler
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler configuration (delays, documents path, URL template)
    /// * `fetcher` - Caching fetcher used for listing pages and documents
    /// * `downloader` - Writes documents under the output root
    /// * `store` - Checkpoint store
    pub fn new(
        config: CrawlerConfig,
        fetcher: PageFetcher,
        downloader: DocumentDownloader,
        store: S,
    ) -> Self {
        let scheduler = Scheduler::from_config(&config);
        let retry_failed = config.retry_failed_folders;

        Self {
            config,
            fetcher,
            downloader,
            store,
            scheduler,
            retry_failed,
            folder_budget: None,
            phase: CrawlPhase::Idle,
        }
    }

    /// Requeues previously failed folders when a checkpoint is loaded
    pub fn with_retry_failed(mut self, retry_failed: bool) -> Self {
        self.retry_failed = retry_failed;
        self
    }

    /// Stops each subdomain after `budget` folders, leaving it suspended
    pub fn with_folder_budget(mut self, budget: Option<usize>) -> Self {
        self.folder_budget = budget;
        self
    }

    /// Phase of the most recent crawl
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn fetcher_mut(&mut self) -> &mut PageFetcher {
        &mut self.fetcher
    }

    /// Crawls one subdomain until its frontier is empty
    ///
    /// Resumes from the stored checkpoint if there is one. Folder and
    /// document failures never end the crawl; a failed bootstrap of a new
    /// crawl is reported in the outcome. Only storage failures are returned
    /// as errors, with the last saved checkpoint left intact.
    ///
    /// The registry entry of the subdomain is updated before returning.
    pub async fn crawl(&mut self, subdomain: &str) -> Result<CrawlOutcome, HarvestError> {
        let site = SiteUrls::for_subdomain(&self.config, subdomain)?;
        self.phase = CrawlPhase::Idle;

        let mut checkpoint = match self.store.load(subdomain)? {
            Some(checkpoint) => {
                tracing::info!(
                    "Resuming {}: {} folders pending, {} visited, {} documents",
                    subdomain,
                    checkpoint.frontier.len(),
                    checkpoint.visited.len(),
                    checkpoint.document_count()
                );
                checkpoint
            }
            None => match self.bootstrap(&site, &site.documents_url()?).await {
                Ok(checkpoint) => {
                    self.store.save(subdomain, &checkpoint)?;
                    checkpoint
                }
                Err(e) => {
                    tracing::error!("Could not bootstrap {}: {}", subdomain, e);
                    let outcome = CrawlOutcome::bootstrap_failed(subdomain, &e);
                    self.store.update_registry(subdomain, outcome.registry_entry())?;
                    return Ok(outcome);
                }
            },
        };

        if self.retry_failed && !checkpoint.failed.is_empty() {
            let requeued = checkpoint.requeue_failed();
            let urls: Vec<String> = requeued
                .iter()
                .filter_map(|f| site.item_url(f).ok())
                .map(String::from)
                .collect();
            match self.fetcher.evict(&urls) {
                Ok(evicted) => tracing::info!(
                    "Requeued {} failed folders for {} ({} cache entries evicted)",
                    requeued.len(),
                    subdomain,
                    evicted
                ),
                Err(e) => tracing::warn!(
                    "Requeued {} failed folders for {}, but cache eviction failed: {}",
                    requeued.len(),
                    subdomain,
                    e
                ),
            }
            self.store.save(subdomain, &checkpoint)?;
        }

        self.phase = CrawlPhase::Running;
        let mut processed = 0usize;

        while !checkpoint.is_complete() {
            if self.folder_budget.is_some_and(|budget| processed >= budget) {
                tracing::info!(
                    "Folder budget reached for {}, {} folders left",
                    subdomain,
                    checkpoint.frontier.len()
                );
                break;
            }

            let Some(folder) = checkpoint.pop_next() else {
                break;
            };

            self.scheduler.wait_for_folder_slot().await;
            tracing::info!("Searching folder {} ({})", folder.location(), folder.url);

            let outcome = self.process_folder(&site, &folder).await;
            match &outcome {
                FolderOutcome::Listed { folders, records } => tracing::info!(
                    "Found {} folders and {} documents in {}",
                    folders.len(),
                    records.len(),
                    folder.location()
                ),
                FolderOutcome::Failed { error } => {
                    tracing::error!("Failed to list folder {}: {}", folder.location(), error)
                }
            }

            checkpoint.apply(folder, outcome);
            self.store.save(subdomain, &checkpoint)?;
            processed += 1;

            tracing::debug!(
                "{}: {} pending, {} visited, {} documents",
                subdomain,
                checkpoint.frontier.len(),
                checkpoint.visited.len(),
                checkpoint.document_count()
            );
        }

        self.phase = CrawlPhase::after_stop(checkpoint.is_complete());
        let outcome = CrawlOutcome::from_checkpoint(subdomain, &checkpoint, self.phase);
        self.store.update_registry(subdomain, outcome.registry_entry())?;

        tracing::info!(
            "{} {}: {} documents ({} with errors), {} folders failed",
            subdomain,
            self.phase,
            outcome.document_count,
            outcome.error_count,
            outcome.folders_failed
        );

        Ok(outcome)
    }

    /// Fetches the document center root and seeds a new checkpoint with it
    ///
    /// The root page lands in the cache, so the root's own listing fetch
    /// does not hit the network again.
    async fn bootstrap(
        &mut self,
        site: &SiteUrls,
        root_url: &Url,
    ) -> Result<CrawlCheckpoint, FetchError> {
        tracing::info!("Starting new crawl of {} at {}", site.subdomain, root_url);
        self.fetcher.fetch(root_url.as_str()).await?;
        Ok(CrawlCheckpoint::seeded(ItemRef::root(&site.documents_path)))
    }

    /// Lists one folder and downloads its documents
    async fn process_folder(&mut self, site: &SiteUrls, folder: &FolderRef) -> FolderOutcome {
        let url = match site.item_url(folder) {
            Ok(url) => url,
            Err(e) => {
                return FolderOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        let snapshot = match self.fetcher.fetch(url.as_str()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return FolderOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let listing = parse_listing(&snapshot.text(), folder, &url);

        let mut records = Vec::with_capacity(listing.documents.len());
        for document in &listing.documents {
            tracing::debug!("Downloading {} ({})", document.name, document.url);
            records.push(self.downloader.download(&mut self.fetcher, document, site).await);
        }

        FolderOutcome::Listed {
            folders: listing.folders,
            records,
        }
    }
}
