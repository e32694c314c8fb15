//! Document downloads
//!
//! Fetches one document, resolves its file type and writes it to
//! `<documents-root>/<subdomain>/<parent path>/<name><extension>`. Every
//! call yields a [`DownloadRecord`]; failures end up in its `error` field.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::filetype::resolve_file_type;
use crate::state::{DocumentRef, DownloadRecord};
use crate::url::SiteUrls;
use std::path::{Path, PathBuf};

/// Format of `scraped_at` in download records
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes documents under an output root
#[derive(Debug, Clone)]
pub struct DocumentDownloader {
    output_root: PathBuf,
}

impl DocumentDownloader {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Directory a document with the given parent path is written to
    pub fn output_dir(&self, subdomain: &str, parent_path: &[String]) -> PathBuf {
        let mut dir = self.output_root.join(sanitize_segment(subdomain));
        for segment in parent_path {
            dir.push(sanitize_segment(segment));
        }
        dir
    }

    /// Downloads one document
    ///
    /// Never fails: fetch, file type and write errors are reported in the
    /// returned record, with `scraped_at` left empty.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher used for the document request
    /// * `document` - The document to download
    /// * `site` - Addresses of the site the document belongs to
    pub async fn download(
        &self,
        fetcher: &mut PageFetcher,
        document: &DocumentRef,
        site: &SiteUrls,
    ) -> DownloadRecord {
        let mut record = DownloadRecord::pending(document, &site.subdomain, &site.root_url);
        let url = match site.item_url(document) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot resolve {} ({}): {}", document.name, document.url, e);
                record.error = e.to_string();
                return record;
            }
        };

        let snapshot = match fetcher.fetch(url.as_str()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", document.name, e);
                record.error = e.to_string();
                return record;
            }
        };

        let resolved = match resolve_file_type(snapshot.content_type.as_deref()) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Skipping {} ({}): {}", document.name, url, e);
                record.error = e.to_string();
                return record;
            }
        };

        record.name = format!("{}{}", document.name, resolved.extension);
        record.file_type = resolved.mime_type;

        let dir = self.output_dir(&site.subdomain, &document.parent_path);
        let path = dir.join(sanitize_segment(&record.name));

        if let Err(e) = write_document(&dir, &path, &snapshot.body).await {
            tracing::warn!("Could not write {}: {}", path.display(), e);
            record.error = format!("Could not write {}: {}", path.display(), e);
            return record;
        }

        record.scraped_at = snapshot.fetched_at.format(SCRAPED_AT_FORMAT).to_string();
        tracing::debug!(
            "Saved {} ({} bytes{})",
            path.display(),
            snapshot.body.len(),
            if snapshot.from_cache { ", cached" } else { "" }
        );

        record
    }
}

async fn write_document(dir: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, body).await
}

/// Makes a folder or file name safe to use as one path segment
///
/// Separators and control characters become `_`, as do `.`, `..` and the
/// empty name.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
