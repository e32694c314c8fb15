use crate::config::types::{Config, CrawlerConfig, OutputConfig, SubdomainEntry, UserAgentConfig};
use crate::url::{site_root_for, validate_subdomain};
use crate::ConfigError;

/// Longest inter-folder delay accepted (milliseconds)
const MAX_FOLDER_DELAY_MS: u64 = 60_000;

/// Longest cache TTL accepted (ten years, in seconds)
const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_subdomains(&config.subdomains, &config.crawler)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.folder_delay_ms > MAX_FOLDER_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "folder_delay_ms must be <= {}ms, got {}ms",
            MAX_FOLDER_DELAY_MS, config.folder_delay_ms
        )));
    }

    if config.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache_ttl_secs must be greater than 0".to_string(),
        ));
    }

    if config.cache_ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(ConfigError::Validation(format!(
            "cache_ttl_secs must be <= {}s, got {}s",
            MAX_CACHE_TTL_SECS, config.cache_ttl_secs
        )));
    }

    if config.request_timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be greater than 0".to_string(),
        ));
    }

    if !config.documents_path.starts_with('/') || !config.documents_path.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "documents_path must start and end with '/', got '{}'",
            config.documents_path
        )));
    }

    if !config.site_url_template.contains("{subdomain}") {
        return Err(ConfigError::Validation(format!(
            "site_url_template must contain '{{subdomain}}', got '{}'",
            config.site_url_template
        )));
    }

    // A known-good label must expand to a usable URL
    site_root_for(&config.site_url_template, "example")
        .map_err(|e| ConfigError::InvalidUrl(format!("site_url_template: {}", e)))?;

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.header.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent header cannot be empty".to_string(),
        ));
    }

    if config.header.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user-agent header cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.documents_root.is_empty() {
        return Err(ConfigError::Validation(
            "documents_root cannot be empty".to_string(),
        ));
    }

    if config.state_dir.is_empty() {
        return Err(ConfigError::Validation(
            "state_dir cannot be empty".to_string(),
        ));
    }

    if config.cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates subdomain entries
fn validate_subdomains(
    entries: &[SubdomainEntry],
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();

    for entry in entries {
        validate_subdomain(&entry.name)
            .map_err(|e| ConfigError::InvalidSubdomain(e.to_string()))?;

        site_root_for(&crawler.site_url_template, &entry.name).map_err(|e| {
            ConfigError::InvalidUrl(format!("Subdomain '{}': {}", entry.name, e))
        })?;

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Subdomain '{}' is listed more than once",
                entry.name
            )));
        }
    }

    Ok(())
}
