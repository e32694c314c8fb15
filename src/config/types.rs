use serde::Deserialize;

/// User agent sent with every request unless the config overrides it
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.125 Safari/537.36";

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "subdomain", default)]
    pub subdomains: Vec<SubdomainEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Delay enforced between successive folder-page fetches (milliseconds)
    #[serde(rename = "folder-delay-ms", default = "default_folder_delay_ms")]
    pub folder_delay_ms: u64,

    /// How long a cached response stays fresh (seconds)
    #[serde(rename = "cache-ttl-secs", default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Total request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(
        rename = "connect-timeout-secs",
        default = "default_connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,

    /// Path of the document center root, relative to the site root
    #[serde(rename = "documents-path", default = "default_documents_path")]
    pub documents_path: String,

    /// Site root for a subdomain; `{subdomain}` is substituted
    #[serde(rename = "site-url-template", default = "default_site_url_template")]
    pub site_url_template: String,

    /// Move folders whose listing failed on a previous run back into the frontier
    #[serde(rename = "retry-failed-folders", default)]
    pub retry_failed_folders: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header
    #[serde(default = "default_user_agent")]
    pub header: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory documents are written under
    #[serde(rename = "documents-root", default = "default_documents_root")]
    pub documents_root: String,

    /// Directory holding checkpoints, tracking files and the registry
    #[serde(rename = "state-dir", default = "default_state_dir")]
    pub state_dir: String,

    /// Path to the SQLite response cache
    #[serde(rename = "cache-path", default = "default_cache_path")]
    pub cache_path: String,
}

/// One site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SubdomainEntry {
    /// Subdomain label, e.g. "springfield" for springfield.civicweb.net
    pub name: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            folder_delay_ms: default_folder_delay_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            documents_path: default_documents_path(),
            site_url_template: default_site_url_template(),
            retry_failed_folders: false,
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            header: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            documents_root: default_documents_root(),
            state_dir: default_state_dir(),
            cache_path: default_cache_path(),
        }
    }
}

fn default_folder_delay_ms() -> u64 {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    3600 * 24 * 14
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_documents_path() -> String {
    "/filepro/documents/".to_string()
}

fn default_site_url_template() -> String {
    "https://{subdomain}.civicweb.net".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_documents_root() -> String {
    "./out".to_string()
}

fn default_state_dir() -> String {
    "./state".to_string()
}

fn default_cache_path() -> String {
    "./scraper_cache.sqlite".to_string()
}
