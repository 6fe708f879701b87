//! Types for the discovery module.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A discovered source file awaiting conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Full path of the source file.
    pub path: PathBuf,
    /// File name (last path component).
    pub name: String,
    /// Size at discovery time.
    pub size_bytes: u64,
    /// Modification time at discovery time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

impl WorkItem {
    /// Creates a work item for a path, without file metadata.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        Self {
            path,
            name,
            size_bytes: 0,
            modified: None,
        }
    }

    /// Sets the file metadata captured at discovery time.
    pub fn with_metadata(mut self, size_bytes: u64, modified: Option<SystemTime>) -> Self {
        self.size_bytes = size_bytes;
        self.modified = modified;
        self
    }

    /// Whether `other` refers to the same file in the same state.
    pub fn same_fingerprint(&self, other: &WorkItem) -> bool {
        self.path == other.path
            && self.size_bytes == other.size_bytes
            && self.modified == other.modified
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// FIFO queue of work items for one cycle.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item at the back.
    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    /// Takes the next item from the front.
    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    /// Number of items still queued.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is drained.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over queued items without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    /// Keeps only the items matching the predicate, preserving order.
    pub fn retain(&mut self, f: impl FnMut(&WorkItem) -> bool) {
        self.items.retain(f);
    }
}

impl From<Vec<WorkItem>> for WorkQueue {
    fn from(items: Vec<WorkItem>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl FromIterator<WorkItem> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
