//! CivicWeb Harvester main entry point
//!
//! This is the command-line interface for the CivicWeb document center crawler.

use anyhow::Context;
use civicweb_harvester::config::{load_config_with_hash, Config};
use civicweb_harvester::crawler::{build_crawler, run_harvest, select_subdomains, HarvestOptions};
use civicweb_harvester::output::print_statistics;
use civicweb_harvester::storage::{CrawlStateStore, FileStateStore};
use civicweb_harvester::url::SiteUrls;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CivicWeb Harvester: a resumable document center crawler
///
/// Walks the folder tree of each configured CivicWeb site breadth-first,
/// downloads every document it finds, and saves its progress after every
/// folder so an interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "civicweb-harvester")]
#[command(version)]
#[command(
    about = "A resumable CivicWeb document center crawler",
    long_about = None
)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only crawl this subdomain (repeatable)
    #[arg(long = "subdomain", value_name = "NAME")]
    subdomains: Vec<String>,

    /// Discard the checkpoints of the selected subdomains and start over
    #[arg(long)]
    fresh: bool,

    /// Requeue folders whose listing failed in an earlier run
    #[arg(long)]
    retry_failed: bool,

    /// Also crawl subdomains the registry marks complete
    #[arg(long)]
    include_complete: bool,

    /// Stop each subdomain after this many folders
    #[arg(long, value_name = "N")]
    max_folders: Option<usize>,

    /// Drop every cached response before crawling
    #[arg(long)]
    clear_cache: bool,

    /// Drop the cached response for this URL before crawling (repeatable)
    #[arg(long = "evict", value_name = "URL")]
    evict: Vec<String>,

    /// Drop cached responses older than the cache TTL before crawling
    #[arg(long)]
    purge_expired: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the subdomain registry and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    fn harvest_options(&self) -> HarvestOptions {
        HarvestOptions {
            subdomains: self.subdomains.clone(),
            fresh: self.fresh,
            retry_failed: self.retry_failed,
            include_complete: self.include_complete,
            max_folders: self.max_folders,
        }
    }

    fn touches_cache(&self) -> bool {
        self.clear_cache || self.purge_expired || !self.evict.is_empty()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.subdomains)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        if cli.touches_cache() {
            handle_cache_maintenance(&config, &cli)?;
        }
        handle_harvest(&config, &cli.harvest_options()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("civicweb_harvester=info,warn"),
            1 => EnvFilter::new("civicweb_harvester=debug,info"),
            2 => EnvFilter::new("civicweb_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, requested: &[String]) -> anyhow::Result<()> {
    println!("=== CivicWeb Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Folder delay: {}ms", config.crawler.folder_delay_ms);
    println!("  Cache TTL: {}s", config.crawler.cache_ttl_secs);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!("  Documents path: {}", config.crawler.documents_path);
    println!(
        "  Retry failed folders: {}",
        config.crawler.retry_failed_folders
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header);

    println!("\nOutput:");
    println!("  Documents: {}", config.output.documents_root);
    println!("  State: {}", config.output.state_dir);
    println!("  Cache: {}", config.output.cache_path);

    let selected = select_subdomains(config, requested)?;
    println!("\nSubdomains ({}):", selected.len());
    for subdomain in &selected {
        let site = SiteUrls::for_subdomain(&config.crawler, subdomain)?;
        println!("  - {} ({})", subdomain, site.documents_url()?);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} subdomains", selected.len());

    Ok(())
}

/// Handles the --stats mode: shows the subdomain registry
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = FileStateStore::open(Path::new(&config.output.state_dir))?;
    println!("State directory: {}\n", config.output.state_dir);

    let registry = store.load_registry()?;
    print_statistics(&registry);

    Ok(())
}

/// Applies --clear-cache, --purge-expired and --evict
fn handle_cache_maintenance(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let mut crawler = build_crawler(config)?;
    let fetcher = crawler.fetcher_mut();

    if cli.clear_cache {
        let removed = fetcher.clear_cache()?;
        tracing::info!("Cleared {} cached responses", removed);
    } else if cli.purge_expired {
        let removed = fetcher.purge_expired()?;
        tracing::info!("Purged {} expired cached responses", removed);
    }

    if !cli.evict.is_empty() {
        let removed = fetcher.evict(&cli.evict)?;
        tracing::info!(
            "Evicted {} of {} cached responses",
            removed,
            cli.evict.len()
        );
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, options: &HarvestOptions) -> anyhow::Result<()> {
    if options.fresh {
        tracing::info!("Starting fresh (discarding checkpoints of selected subdomains)");
    } else {
        tracing::info!("Starting harvest (will resume from existing checkpoints)");
    }

    match run_harvest(config, options).await {
        Ok(summary) => {
            summary.print();
            if !summary.failed().is_empty() {
                tracing::warn!("{} subdomains failed", summary.failed().len());
            }
            tracing::info!("Harvest finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
