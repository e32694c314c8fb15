//! Folder/document references and download records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which kind of anchor a listing page item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRole {
    /// Link to another listing page
    Folder,

    /// Link to a downloadable file
    Document,
}

impl ItemRole {
    /// CSS class the listing page puts on anchors of this role
    pub fn marker_class(&self) -> &'static str {
        match self {
            Self::Folder => "folder-link",
            Self::Document => "document-link",
        }
    }
}

/// A node in a site's folder tree, as found on its parent's listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Display name, trimmed
    pub name: String,

    /// Site-relative link target
    pub url: String,

    /// Ancestor folder names from the root down to the immediate parent
    pub parent_path: Vec<String>,

    /// Site-relative URL of the parent folder's listing page
    pub parent_url: String,
}

/// A folder whose listing page lists further items
pub type FolderRef = ItemRef;

/// A leaf document
pub type DocumentRef = ItemRef;

impl ItemRef {
    /// The document center root, the anchor of every crawl
    ///
    /// The root has no name and contributes no segment to its children's paths.
    pub fn root(documents_path: &str) -> Self {
        Self {
            name: String::new(),
            url: documents_path.to_string(),
            parent_path: Vec::new(),
            parent_url: String::new(),
        }
    }

    /// Returns true for the document center root
    pub fn is_root(&self) -> bool {
        self.name.is_empty() && self.parent_path.is_empty() && self.parent_url.is_empty()
    }

    /// Path handed to the items listed inside this folder
    pub fn child_path(&self) -> Vec<String> {
        let mut path = self.parent_path.clone();
        if !self.is_root() {
            path.push(self.name.clone());
        }
        path
    }

    /// Distance from the root; the root is depth 0
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.parent_path.len() + 1
        }
    }

    /// Parent path joined with `/`, as stored in tracking rows
    pub fn joined_parent_path(&self) -> String {
        self.parent_path.join("/")
    }

    /// Human-readable location used in log lines
    pub fn location(&self) -> String {
        let path = self.child_path();
        if path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", path.join("/"))
        }
    }
}

/// One row of crawl output, produced exactly once per document processed
///
/// Failures are carried in `error`; `scraped_at` is empty unless the
/// document was written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Document name plus resolved extension
    pub name: String,

    /// MIME type from the response, or empty
    pub file_type: String,

    pub subdomain: String,

    /// Ancestor folder names joined with `/`
    pub parent_path: String,

    pub root_url: String,

    pub url: String,

    pub parent_url: String,

    /// Fetch time `%Y-%m-%d %H:%M:%S`, or empty on failure
    pub scraped_at: String,

    /// Empty on success, otherwise the cause
    pub error: String,
}

impl DownloadRecord {
    /// Starts a record for a document with nothing resolved yet
    pub fn pending(document: &DocumentRef, subdomain: &str, root_url: &str) -> Self {
        Self {
            name: document.name.clone(),
            file_type: String::new(),
            subdomain: subdomain.to_string(),
            parent_path: document.joined_parent_path(),
            root_url: root_url.to_string(),
            url: document.url.clone(),
            parent_url: document.parent_url.clone(),
            scraped_at: String::new(),
            error: String::new(),
        }
    }

    /// Returns true if the document was downloaded
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }

    /// Identity of the document this record describes
    pub fn key(&self) -> (String, String) {
        (self.url.clone(), self.parent_url.clone())
    }
}

/// Ordered set of download records keyed by `(url, parent_url)`
///
/// Inserting a record for a key already present replaces the old record in
/// place, so re-processing a folder never duplicates rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<DownloadRecord>,
    index: HashMap<(String, String), usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record; returns true if the key was new
    pub fn insert(&mut self, record: DownloadRecord) -> bool {
        let key = record.key();
        match self.index.get(&key) {
            Some(&position) => {
                self.records[position] = record;
                false
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    /// Looks up the record for a document
    pub fn get(&self, url: &str, parent_url: &str) -> Option<&DownloadRecord> {
        self.index
            .get(&(url.to_string(), parent_url.to_string()))
            .map(|&position| &self.records[position])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.iter()
    }

    /// Number of records carrying an error
    pub fn error_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_success()).count()
    }
}

impl FromIterator<DownloadRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = DownloadRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
