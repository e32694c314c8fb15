//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to the CivicWeb defaults.
//!
//! # Example
//!
//! ```no_run
//! use civicweb_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Crawling {} subdomains", config.subdomains.len());
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, OutputConfig, SubdomainEntry, UserAgentConfig, DEFAULT_USER_AGENT,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
