//! Directory listing scanner.

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::config::DiscoveryConfig;
use super::error::DiscoveryError;
use super::traits::Scanner;
use super::types::{WorkItem, WorkQueue};

/// Lists the regular files directly inside the source directory.
///
/// Entries are ordered by file name so that a cycle processes files in a
/// stable order regardless of how the filesystem returns them.
pub struct DirScanner {
    config: DiscoveryConfig,
}

impl DirScanner {
    /// Creates a scanner for the configured directory.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Scanner for DirScanner {
    fn name(&self) -> &str {
        "dir"
    }

    async fn scan(&self) -> Result<WorkQueue, DiscoveryError> {
        let source_dir = &self.config.source_dir;

        let meta = fs::metadata(source_dir)
            .await
            .map_err(|e| DiscoveryError::from_io(source_dir.clone(), e))?;
        if !meta.is_dir() {
            return Err(DiscoveryError::NotADirectory {
                path: source_dir.clone(),
            });
        }

        let mut entries = fs::read_dir(source_dir)
            .await
            .map_err(|e| DiscoveryError::from_io(source_dir.clone(), e))?;

        let mut items = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DiscoveryError::from_io(source_dir.clone(), e))?
        {
            let path = entry.path();
            // Follows symlinks; an entry that vanished since listing is skipped
            let meta = match fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !meta.is_file() {
                debug!("Skipping non-file entry {}", path.display());
                continue;
            }
            items.push(WorkItem::new(path).with_metadata(meta.len(), meta.modified().ok()));
        }

        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_scan_lists_files_in_name_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.mkv"), "bb").await.unwrap();
        fs::write(temp.path().join("a.mov"), "a").await.unwrap();
        fs::write(temp.path().join("notes.txt"), "no filter").await.unwrap();

        let scanner = DirScanner::new(DiscoveryConfig::new(temp.path()));
        let mut queue = scanner.scan().await.unwrap();

        assert_eq!(queue.len(), 3);
        let first = queue.pop().unwrap();
        assert_eq!(first.name, "a.mov");
        assert_eq!(first.size_bytes, 1);
        assert_eq!(first.path, temp.path().join("a.mov"));
        assert_eq!(queue.pop().unwrap().name, "b.mkv");
        assert_eq!(queue.pop().unwrap().name, "notes.txt");
    }

    #[tokio::test]
    async fn test_scan_is_not_recursive() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).await.unwrap();
        fs::write(temp.path().join("nested/deep.mov"), "x").await.unwrap();
        fs::write(temp.path().join("top.mov"), "x").await.unwrap();

        let scanner = DirScanner::new(DiscoveryConfig::new(temp.path()));
        let queue = scanner.scan().await.unwrap();

        let names: Vec<_> = queue.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["top.mov".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let scanner = DirScanner::new(DiscoveryConfig::new(temp.path()));
        let queue = scanner.scan().await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_scan_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let scanner = DirScanner::new(DiscoveryConfig::new(temp.path().join("gone")));
        let result = scanner.scan().await;
        assert!(matches!(result, Err(DiscoveryError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_scan_file_as_source_is_an_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.mov");
        fs::write(&file, "x").await.unwrap();

        let scanner = DirScanner::new(DiscoveryConfig::new(&file));
        let result = scanner.scan().await;
        assert!(matches!(result, Err(DiscoveryError::NotADirectory { .. })));
    }
}
