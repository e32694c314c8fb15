//! Resumable crawl state for one subdomain
//!
//! The checkpoint is the single source of truth for a crawl: it is loaded,
//! advanced one folder at a time, and saved as one unit.

use crate::state::items::{DownloadRecord, FolderRef, RecordSet};
use std::collections::VecDeque;

/// Result of processing one dequeued folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// The listing page was fetched; children were extracted and documents processed
    Listed {
        folders: Vec<FolderRef>,
        records: Vec<DownloadRecord>,
    },

    /// The listing page could not be fetched
    Failed { error: String },
}

/// The state of one subdomain's crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlCheckpoint {
    /// Folders discovered but not yet visited, FIFO
    pub frontier: VecDeque<FolderRef>,

    /// Folders whose listing was processed, in visit order
    pub visited: Vec<FolderRef>,

    /// Folders whose listing fetch failed and were set aside
    pub failed: Vec<FolderRef>,

    /// Accumulated download records
    pub records: RecordSet,
}

impl CrawlCheckpoint {
    /// Creates a checkpoint whose frontier holds only the given folder
    pub fn seeded(root: FolderRef) -> Self {
        Self {
            frontier: VecDeque::from(vec![root]),
            ..Self::default()
        }
    }

    /// Removes the next folder to visit
    pub fn pop_next(&mut self) -> Option<FolderRef> {
        self.frontier.pop_front()
    }

    /// Folds the outcome of processing `folder` into the checkpoint
    ///
    /// A listed folder is appended to `visited`, its subfolders to the tail of
    /// the frontier and its records to the record set. A failed folder goes to
    /// `failed` and does not count as visited.
    pub fn apply(&mut self, folder: FolderRef, outcome: FolderOutcome) {
        match outcome {
            FolderOutcome::Listed { folders, records } => {
                self.frontier.extend(folders);
                for record in records {
                    self.records.insert(record);
                }
                self.visited.push(folder);
            }
            FolderOutcome::Failed { .. } => {
                self.failed.push(folder);
            }
        }
    }

    /// Moves every failed folder to the tail of the frontier
    ///
    /// Returns the folders that were moved.
    pub fn requeue_failed(&mut self) -> Vec<FolderRef> {
        let moved: Vec<FolderRef> = self.failed.drain(..).collect();
        self.frontier.extend(moved.iter().cloned());
        moved
    }

    /// Returns true once the frontier is exhausted
    pub fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of documents recorded so far
    pub fn document_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::items::ItemRef;

    fn child_of(parent: &FolderRef, name: &str) -> FolderRef {
        ItemRef {
            name: name.to_string(),
            url: format!("{}{}/", parent.url, name.to_lowercase()),
            parent_path: parent.child_path(),
            parent_url: parent.url.clone(),
        }
    }

    fn record_for(document: &ItemRef) -> DownloadRecord {
        DownloadRecord::pending(document, "springfield", "https://springfield.civicweb.net")
    }

    #[test]
    fn test_seeded_checkpoint() {
        let root = ItemRef::root("/filepro/documents/");
        let checkpoint = CrawlCheckpoint::seeded(root.clone());

        assert_eq!(checkpoint.frontier.len(), 1);
        assert_eq!(checkpoint.frontier[0], root);
        assert!(checkpoint.visited.is_empty());
        assert!(!checkpoint.is_complete());
    }

    #[test]
    fn test_apply_listed_moves_folder_to_visited() {
        let root = ItemRef::root("/filepro/documents/");
        let mut checkpoint = CrawlCheckpoint::seeded(root.clone());

        let folder = checkpoint.pop_next().unwrap();
        let agendas = child_of(&folder, "Agendas");
        let doc = child_of(&folder, "Budget");
        checkpoint.apply(
            folder,
            FolderOutcome::Listed {
                folders: vec![agendas.clone()],
                records: vec![record_for(&doc)],
            },
        );

        assert_eq!(checkpoint.visited, vec![root]);
        assert_eq!(checkpoint.frontier.front(), Some(&agendas));
        assert_eq!(checkpoint.document_count(), 1);
    }

    #[test]
    fn test_apply_failed_does_not_visit() {
        let root = ItemRef::root("/filepro/documents/");
        let mut checkpoint = CrawlCheckpoint::seeded(root.clone());

        let folder = checkpoint.pop_next().unwrap();
        checkpoint.apply(
            folder,
            FolderOutcome::Failed {
                error: "HTTP 500".to_string(),
            },
        );

        assert!(checkpoint.visited.is_empty());
        assert_eq!(checkpoint.failed, vec![root]);
        assert!(checkpoint.is_complete());
    }

    #[test]
    fn test_breadth_first_visit_order() {
        // root -> {A, B}; A -> {A1}; B -> {B1}
        let root = ItemRef::root("/filepro/documents/");
        let a = child_of(&root, "A");
        let b = child_of(&root, "B");
        let a1 = child_of(&a, "A1");
        let b1 = child_of(&b, "B1");

        let children = |f: &FolderRef| -> Vec<FolderRef> {
            if f.is_root() {
                vec![a.clone(), b.clone()]
            } else if f.name == "A" {
                vec![a1.clone()]
            } else if f.name == "B" {
                vec![b1.clone()]
            } else {
                vec![]
            }
        };

        let mut checkpoint = CrawlCheckpoint::seeded(root);
        while let Some(folder) = checkpoint.pop_next() {
            let folders = children(&folder);
            for child in &folders {
                assert_eq!(child.parent_path, folder.child_path());
            }
            checkpoint.apply(
                folder,
                FolderOutcome::Listed {
                    folders,
                    records: vec![],
                },
            );
        }

        let names: Vec<_> = checkpoint.visited.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["", "A", "B", "A1", "B1"]);

        let depths: Vec<_> = checkpoint.visited.iter().map(|f| f.depth()).collect();
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_reapplying_folder_does_not_duplicate_records() {
        let root = ItemRef::root("/filepro/documents/");
        let doc = child_of(&root, "Budget");
        let mut checkpoint = CrawlCheckpoint::default();

        for _ in 0..2 {
            checkpoint.apply(
                root.clone(),
                FolderOutcome::Listed {
                    folders: vec![],
                    records: vec![record_for(&doc)],
                },
            );
        }

        assert_eq!(checkpoint.document_count(), 1);
    }

    #[test]
    fn test_requeue_failed() {
        let root = ItemRef::root("/filepro/documents/");
        let a = child_of(&root, "A");
        let b = child_of(&root, "B");

        let mut checkpoint = CrawlCheckpoint::seeded(b.clone());
        checkpoint.failed.push(a.clone());

        let moved = checkpoint.requeue_failed();

        assert_eq!(moved, vec![a.clone()]);
        assert!(checkpoint.failed.is_empty());
        assert_eq!(checkpoint.frontier, VecDeque::from(vec![b, a]));
    }
}
