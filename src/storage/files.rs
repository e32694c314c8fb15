//! File-backed checkpoint store
//!
//! Each subdomain owns two files under the state directory:
//!
//! - `<subdomain>_folders.json` with the pending (`folders`), visited
//!   (`done_folders`) and failed (`failed_folders`) folder lists
//! - `<subdomain>_documents.csv` with one row per download record
//!
//! plus the shared registry `subdomains.json`. Every file is written to a
//! temporary sibling and renamed into place.

use crate::state::{CrawlCheckpoint, DownloadRecord, FolderRef, RecordSet};
use crate::storage::traits::{CrawlStateStore, StorageResult};
use crate::storage::{Registry, RegistryEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Header row of the document tracking file
pub const TRACKING_HEADER: [&str; 9] = [
    "name",
    "file_type",
    "subdomain",
    "parent_path",
    "root_url",
    "url",
    "parent_url",
    "scraped_at",
    "error",
];

const REGISTRY_FILE: &str = "subdomains.json";

/// On-disk shape of the folder checkpoint
#[derive(Debug, Serialize, Deserialize)]
struct FolderFile {
    folders: Vec<FolderRef>,
    done_folders: Vec<FolderRef>,
    #[serde(default)]
    failed_folders: Vec<FolderRef>,
}

/// Checkpoint store rooted at a state directory
pub struct FileStateStore {
    state_dir: PathBuf,
}

impl FileStateStore {
    /// Opens a store, creating the state directory if needed
    pub fn open(state_dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(state_dir)?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
        })
    }

    /// Path of a subdomain's folder checkpoint
    pub fn checkpoint_path(&self, subdomain: &str) -> PathBuf {
        self.state_dir.join(format!("{}_folders.json", subdomain))
    }

    /// Path of a subdomain's document tracking file
    pub fn tracking_path(&self, subdomain: &str) -> PathBuf {
        self.state_dir.join(format!("{}_documents.csv", subdomain))
    }

    /// Path of the subdomain registry
    pub fn registry_path(&self) -> PathBuf {
        self.state_dir.join(REGISTRY_FILE)
    }

    fn read_records(&self, subdomain: &str) -> StorageResult<RecordSet> {
        let path = self.tracking_path(subdomain);
        if !path.exists() {
            return Ok(RecordSet::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = RecordSet::new();
        for row in reader.deserialize::<DownloadRecord>() {
            records.insert(row?);
        }
        Ok(records)
    }

    fn write_records(&self, subdomain: &str, records: &RecordSet) -> StorageResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(TRACKING_HEADER)?;
        for record in records.iter() {
            writer.serialize(record)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        write_atomic(&self.tracking_path(subdomain), &bytes)?;
        Ok(())
    }
}

impl CrawlStateStore for FileStateStore {
    fn load(&self, subdomain: &str) -> StorageResult<Option<CrawlCheckpoint>> {
        let path = self.checkpoint_path(subdomain);
        if !path.exists() {
            return Ok(None);
        }

        let folder_file: FolderFile = serde_json::from_slice(&fs::read(&path)?)?;
        let records = self.read_records(subdomain)?;

        Ok(Some(CrawlCheckpoint {
            frontier: folder_file.folders.into(),
            visited: folder_file.done_folders,
            failed: folder_file.failed_folders,
            records,
        }))
    }

    fn save(&mut self, subdomain: &str, checkpoint: &CrawlCheckpoint) -> StorageResult<()> {
        // Records first: a checkpoint never points past the rows on disk
        self.write_records(subdomain, &checkpoint.records)?;

        let folder_file = FolderFile {
            folders: checkpoint.frontier.iter().cloned().collect(),
            done_folders: checkpoint.visited.clone(),
            failed_folders: checkpoint.failed.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&folder_file)?;
        write_atomic(&self.checkpoint_path(subdomain), &bytes)?;

        Ok(())
    }

    fn reset(&mut self, subdomain: &str) -> StorageResult<()> {
        remove_if_exists(&self.checkpoint_path(subdomain))?;
        remove_if_exists(&self.tracking_path(subdomain))?;
        Ok(())
    }

    fn load_registry(&self) -> StorageResult<Registry> {
        let path = self.registry_path();
        if !path.exists() {
            return Ok(Registry::new());
        }
        Ok(serde_json::from_slice(&fs::read(&path)?)?)
    }

    fn update_registry(&mut self, subdomain: &str, entry: RegistryEntry) -> StorageResult<()> {
        let mut registry = self.load_registry()?;
        registry.insert(subdomain.to_string(), entry);
        let bytes = serde_json::to_vec_pretty(&registry)?;
        write_atomic(&self.registry_path(), &bytes)?;
        Ok(())
    }
}

/// Writes `bytes` to a temporary sibling of `path` and renames it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
