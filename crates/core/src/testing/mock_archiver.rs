//! Mock archiver for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::archiver::{ArchiveOutcome, Archiver, ArchiverError, MoveMethod};
use crate::discovery::WorkItem;

/// Mock implementation of the Archiver trait.
///
/// Records archived items and never touches the filesystem. Failures can be
/// injected per source path.
#[derive(Debug, Clone)]
pub struct MockArchiver {
    archive_dir: PathBuf,
    archived: Arc<RwLock<Vec<WorkItem>>>,
    errors: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl Default for MockArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArchiver {
    /// Create a new mock archiver pretending to archive into `/archive`.
    pub fn new() -> Self {
        Self {
            archive_dir: PathBuf::from("/archive"),
            archived: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Items archived so far, in order.
    pub async fn archived(&self) -> Vec<WorkItem> {
        self.archived.read().await.clone()
    }

    /// Number of items archived.
    pub async fn archive_count(&self) -> usize {
        self.archived.read().await.len()
    }

    /// Make archiving the source `path` fail.
    pub async fn set_error(&self, path: impl AsRef<Path>, reason: &str) {
        self.errors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), reason.to_string());
    }
}

#[async_trait]
impl Archiver for MockArchiver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn archive(&self, item: &WorkItem) -> Result<ArchiveOutcome, ArchiverError> {
        let destination = self.archive_dir.join(&item.name);

        if let Some(reason) = self.errors.read().await.get(&item.path) {
            return Err(ArchiverError::move_failed(
                item.path.clone(),
                destination,
                std::io::Error::other(reason.clone()),
            ));
        }

        let mut archived = self.archived.write().await;
        let backup = archived
            .iter()
            .any(|a| a.name == item.name)
            .then(|| self.archive_dir.join("backup").join(&item.name));
        archived.push(item.clone());

        Ok(ArchiveOutcome {
            source: item.path.clone(),
            destination,
            backup,
            method: MoveMethod::Rename,
            size_bytes: item.size_bytes,
        })
    }

    async fn validate(&self) -> Result<(), ArchiverError> {
        Ok(())
    }
}
