//! Mock scanner for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::discovery::{DiscoveryError, Scanner, WorkItem, WorkQueue};

#[derive(Debug, Clone)]
enum ScriptedScan {
    Items(Vec<WorkItem>),
    Missing(PathBuf),
}

/// Mock implementation of the Scanner trait.
///
/// Returns scripted results in order, then empty queues once the script is
/// exhausted (or the sticky batch, if one is set). Every call is timestamped
/// on the tokio clock so tests can assert on idle waits.
#[derive(Debug, Clone, Default)]
pub struct MockScanner {
    script: Arc<RwLock<VecDeque<ScriptedScan>>>,
    sticky: Arc<RwLock<Option<Vec<WorkItem>>>>,
    scans: Arc<RwLock<Vec<Instant>>>,
}

impl MockScanner {
    /// Create a new mock scanner with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scan result listing `items`.
    pub async fn push_batch(&self, items: Vec<WorkItem>) {
        self.script.write().await.push_back(ScriptedScan::Items(items));
    }

    /// Queue a scan that fails because `path` is missing.
    pub async fn push_missing_dir(&self, path: impl Into<PathBuf>) {
        self.script
            .write()
            .await
            .push_back(ScriptedScan::Missing(path.into()));
    }

    /// Return `items` on every scan after the script runs out.
    pub async fn set_sticky(&self, items: Vec<WorkItem>) {
        *self.sticky.write().await = Some(items);
    }

    /// Times at which `scan` was called.
    pub async fn scan_times(&self) -> Vec<Instant> {
        self.scans.read().await.clone()
    }

    /// Number of times `scan` was called.
    pub async fn scan_count(&self) -> usize {
        self.scans.read().await.len()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scan(&self) -> Result<WorkQueue, DiscoveryError> {
        self.scans.write().await.push(Instant::now());

        match self.script.write().await.pop_front() {
            Some(ScriptedScan::Items(items)) => Ok(items.into()),
            Some(ScriptedScan::Missing(path)) => Err(DiscoveryError::SourceNotFound { path }),
            None => Ok(self
                .sticky
                .read()
                .await
                .clone()
                .map(WorkQueue::from)
                .unwrap_or_default()),
        }
    }
}
