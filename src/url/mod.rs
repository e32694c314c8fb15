//! URL handling module
//!
//! Builds the per-subdomain site root from the configured template and
//! resolves the site-relative links found on listing pages.

mod site;

pub use site::{site_root_for, validate_subdomain};

use crate::config::CrawlerConfig;
use crate::state::ItemRef;
use crate::UrlError;
use url::Url;

/// The addresses of one subdomain's document center
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    /// Subdomain label this site belongs to
    pub subdomain: String,

    /// Site root without a trailing slash, e.g. `https://springfield.civicweb.net`
    pub root_url: String,

    /// Path of the document center root, e.g. `/filepro/documents/`
    pub documents_path: String,

    root: Url,
}

impl SiteUrls {
    /// Builds the site URLs for a subdomain from the crawler configuration
    pub fn for_subdomain(config: &CrawlerConfig, subdomain: &str) -> Result<Self, UrlError> {
        validate_subdomain(subdomain)?;
        let root = site_root_for(&config.site_url_template, subdomain)?;

        Ok(Self {
            subdomain: subdomain.to_string(),
            root_url: root.as_str().trim_end_matches('/').to_string(),
            documents_path: config.documents_path.clone(),
            root,
        })
    }

    /// Absolute URL of the document center root
    pub fn documents_url(&self) -> Result<Url, UrlError> {
        self.resolve(&self.documents_path)
    }

    /// Resolves a site-relative or absolute link against the site root
    pub fn resolve(&self, target: &str) -> Result<Url, UrlError> {
        join(&self.root, target)
    }

    /// Absolute URL of a folder or document
    ///
    /// The item's link is resolved against its parent's listing page, the
    /// page it was found on. The root folder has no parent and resolves
    /// against the site root.
    pub fn item_url(&self, item: &ItemRef) -> Result<Url, UrlError> {
        let page = self.resolve(&item.parent_url)?;
        join(&page, &item.url)
    }
}

fn join(base: &Url, target: &str) -> Result<Url, UrlError> {
    base.join(target.trim())
        .map_err(|e| UrlError::Parse(format!("{} against {}: {}", target, base, e)))
}
