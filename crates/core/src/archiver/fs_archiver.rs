//! File system archiver implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::config::ArchiverConfig;
use super::error::ArchiverError;
use super::traits::Archiver;
use super::types::{ArchiveOutcome, MoveMethod};
use crate::discovery::WorkItem;

/// File system based archiver implementation.
pub struct FsArchiver {
    config: ArchiverConfig,
}

impl FsArchiver {
    /// Creates a new file system archiver with the given configuration.
    pub fn new(config: ArchiverConfig) -> Self {
        Self { config }
    }

    /// Attempts to move a file atomically (rename).
    ///
    /// Returns `Ok(false)` when source and destination are on different
    /// filesystems and the caller has to copy instead.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file, returning the byte count and the SHA-256 of what was read.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(u64, String), ArchiverError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArchiverError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                ArchiverError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            ArchiverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut hasher = Sha256::new();
        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                ArchiverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                ArchiverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            ArchiverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        writer.get_ref().sync_all().await.map_err(|e| {
            ArchiverError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok((total_bytes, format!("{:x}", hasher.finalize())))
    }

    /// Calculates the SHA-256 checksum of a file.
    async fn calculate_checksum(&self, path: &Path) -> Result<String, ArchiverError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Sha256::new();

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Creates a directory and its parents if missing.
    async fn ensure_dir(path: &Path) -> Result<(), ArchiverError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ArchiverError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Hidden staging file next to `destination` used by the copy fallback.
    fn staging_path(destination: &Path) -> PathBuf {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        destination.with_file_name(format!(".{}.partial", name))
    }

    /// Moves `source` to `destination`, renaming when possible.
    async fn transfer(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(MoveMethod, u64), ArchiverError> {
        let moved = Self::try_atomic_move(source, destination)
            .await
            .map_err(|e| {
                ArchiverError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

        if moved {
            let size = fs::metadata(destination).await?.len();
            return Ok((MoveMethod::Rename, size));
        }

        debug!(
            "{} and {} are on different filesystems, copying",
            source.display(),
            destination.display()
        );
        let size = self.copy_across(source, destination).await?;
        Ok((MoveMethod::Copy, size))
    }

    /// Copies into a staging file, verifies it, renames it into place and
    /// only then removes the source.
    async fn copy_across(&self, source: &Path, destination: &Path) -> Result<u64, ArchiverError> {
        let staging = Self::staging_path(destination);

        let staged = async {
            let (size, expected) = self.copy_file(source, &staging).await?;
            if self.config.verify_checksums {
                let actual = self.calculate_checksum(&staging).await?;
                if actual != expected {
                    return Err(ArchiverError::ChecksumMismatch {
                        path: staging.clone(),
                        expected,
                        actual,
                    });
                }
            }
            fs::rename(&staging, destination).await.map_err(|e| {
                ArchiverError::move_failed(staging.clone(), destination.to_path_buf(), e)
            })?;
            Ok(size)
        }
        .await;

        let size = match staged {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&staging).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Failed to remove staging file {}: {}",
                            staging.display(),
                            cleanup
                        );
                    }
                }
                return Err(e);
            }
        };

        if let Err(e) = fs::remove_file(source).await {
            // The archived copy is complete; a leftover source is not data loss
            warn!(
                "Archived {} but failed to remove the source: {}",
                source.display(),
                e
            );
        }
        Ok(size)
    }

    /// Moves a backed-up file back to where it was.
    async fn restore_backup(backup: &Path, destination: &Path) -> Result<(), std::io::Error> {
        fs::rename(backup, destination).await
    }
}

#[async_trait]
impl Archiver for FsArchiver {
    fn name(&self) -> &str {
        "fs"
    }

    async fn archive(&self, item: &WorkItem) -> Result<ArchiveOutcome, ArchiverError> {
        let source = &item.path;
        if let Err(e) = fs::metadata(source).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ArchiverError::SourceNotFound {
                    path: source.clone(),
                });
            }
            return Err(ArchiverError::Io(e));
        }

        Self::ensure_dir(&self.config.archive_dir).await?;
        let destination = self.config.archive_dir.join(&item.name);

        if fs::symlink_metadata(&destination).await.is_err() {
            let (method, size_bytes) = self.transfer(source, &destination).await?;
            info!("Archived {} to {}", item.name, destination.display());
            return Ok(ArchiveOutcome {
                source: source.clone(),
                destination,
                backup: None,
                method,
                size_bytes,
            });
        }

        // Name collision: destination -> backup, then source -> destination
        let backup_dir = self.config.backup_dir();
        Self::ensure_dir(&backup_dir).await?;
        let backup = backup_dir.join(&item.name);
        if fs::symlink_metadata(&backup).await.is_ok() {
            info!("Replacing older backup {}", backup.display());
        }

        fs::rename(&destination, &backup)
            .await
            .map_err(|e| ArchiverError::BackupFailed {
                existing: destination.clone(),
                backup: backup.clone(),
                source: e,
            })?;

        match self.transfer(source, &destination).await {
            Ok((method, size_bytes)) => {
                info!(
                    "Archived {} to {} (previous version moved to {})",
                    item.name,
                    destination.display(),
                    backup.display()
                );
                Ok(ArchiveOutcome {
                    source: source.clone(),
                    destination,
                    backup: Some(backup),
                    method,
                    size_bytes,
                })
            }
            Err(e) => {
                warn!(
                    "Archiving {} failed, restoring {}: {}",
                    item.name,
                    destination.display(),
                    e
                );
                if let Err(restore) = Self::restore_backup(&backup, &destination).await {
                    return Err(ArchiverError::RollbackFailed {
                        destination,
                        backup,
                        reason: format!("{} (after: {})", restore, e),
                    });
                }
                Err(e)
            }
        }
    }

    async fn validate(&self) -> Result<(), ArchiverError> {
        Self::ensure_dir(&self.config.archive_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Dirs {
        _temp: TempDir,
        source: PathBuf,
        archive: PathBuf,
    }

    async fn dirs() -> Dirs {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let archive = temp.path().join("archive");
        fs::create_dir_all(&source).await.unwrap();
        Dirs {
            _temp: temp,
            source,
            archive,
        }
    }

    async fn source_file(dir: &Path, name: &str, content: &str) -> WorkItem {
        let path = dir.join(name);
        fs::write(&path, content).await.unwrap();
        WorkItem::new(path)
    }

    #[tokio::test]
    async fn test_archive_simple_move() {
        let d = dirs().await;
        let item = source_file(&d.source, "a.mov", "original").await;

        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));
        let outcome = archiver.archive(&item).await.unwrap();

        assert_eq!(outcome.destination, d.archive.join("a.mov"));
        assert!(outcome.backup.is_none());
        assert_eq!(outcome.method, MoveMethod::Rename);
        assert_eq!(outcome.size_bytes, 8);
        assert!(!item.path.exists());
        assert_eq!(
            fs::read_to_string(d.archive.join("a.mov")).await.unwrap(),
            "original"
        );
        assert!(!d.archive.join("backup").exists());
    }

    #[tokio::test]
    async fn test_archive_creates_missing_directories() {
        let d = dirs().await;
        let nested = d.archive.join("deep/er");
        let item = source_file(&d.source, "a.mov", "x").await;

        let archiver = FsArchiver::new(ArchiverConfig::new(&nested));
        archiver.archive(&item).await.unwrap();

        assert!(nested.join("a.mov").exists());
    }

    #[tokio::test]
    async fn test_archive_collision_moves_previous_to_backup() {
        let d = dirs().await;
        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));

        let first = source_file(&d.source, "a.mov", "first").await;
        archiver.archive(&first).await.unwrap();

        let second = source_file(&d.source, "a.mov", "second").await;
        let outcome = archiver.archive(&second).await.unwrap();

        let backup = d.archive.join("backup/a.mov");
        assert_eq!(outcome.backup.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read_to_string(&backup).await.unwrap(), "first");
        assert_eq!(
            fs::read_to_string(d.archive.join("a.mov")).await.unwrap(),
            "second"
        );
        assert!(!second.path.exists());

        let mut entries = fs::read_dir(d.archive.join("backup")).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_archive_third_collision_keeps_latest_backup() {
        let d = dirs().await;
        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));

        for content in ["v1", "v2", "v3"] {
            let item = source_file(&d.source, "a.mov", content).await;
            archiver.archive(&item).await.unwrap();
        }

        assert_eq!(
            fs::read_to_string(d.archive.join("a.mov")).await.unwrap(),
            "v3"
        );
        assert_eq!(
            fs::read_to_string(d.archive.join("backup/a.mov"))
                .await
                .unwrap(),
            "v2"
        );
    }

    #[tokio::test]
    async fn test_failed_move_after_backup_restores_previous_version() {
        let d = dirs().await;
        // The kernel refuses to rename a directory into its own subtree,
        // so the move fails only after the backup step.
        let source = d.source.join("a.mov");
        let archive = source.join("archive");
        fs::create_dir_all(&archive).await.unwrap();
        fs::write(archive.join("a.mov"), "previous").await.unwrap();

        let archiver = FsArchiver::new(ArchiverConfig::new(&archive));
        let result = archiver.archive(&WorkItem::new(&source)).await;

        assert!(matches!(result, Err(ArchiverError::MoveFailed { .. })));
        assert_eq!(
            fs::read_to_string(archive.join("a.mov")).await.unwrap(),
            "previous"
        );
        assert!(!archive.join("backup/a.mov").exists());
        assert!(source.is_dir());
        assert!(archive.is_dir());
    }

    #[tokio::test]
    async fn test_archive_missing_source() {
        let d = dirs().await;
        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));

        let result = archiver.archive(&WorkItem::new(d.source.join("gone.mov"))).await;
        assert!(matches!(result, Err(ArchiverError::SourceNotFound { .. })));
        assert!(!d.archive.exists());
    }

    #[tokio::test]
    async fn test_copy_across_verifies_and_removes_source() {
        let d = dirs().await;
        fs::create_dir_all(&d.archive).await.unwrap();
        let item = source_file(&d.source, "a.mov", "copied content").await;
        let destination = d.archive.join("a.mov");

        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive).with_buffer_size(4));
        let size = archiver
            .copy_across(&item.path, &destination)
            .await
            .unwrap();

        assert_eq!(size, 14);
        assert_eq!(
            fs::read_to_string(&destination).await.unwrap(),
            "copied content"
        );
        assert!(!item.path.exists());
        assert!(!FsArchiver::staging_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_copy_across_failure_keeps_source() {
        let d = dirs().await;
        let item = source_file(&d.source, "a.mov", "keep me").await;
        // Archive directory never created, so the staging file cannot be opened
        let destination = d.archive.join("a.mov");

        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));
        let result = archiver.copy_across(&item.path, &destination).await;

        assert!(matches!(result, Err(ArchiverError::CopyFailed { .. })));
        assert_eq!(fs::read_to_string(&item.path).await.unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_restore_backup() {
        let d = dirs().await;
        fs::create_dir_all(d.archive.join("backup")).await.unwrap();
        let backup = d.archive.join("backup/a.mov");
        fs::write(&backup, "previous").await.unwrap();
        let destination = d.archive.join("a.mov");

        FsArchiver::restore_backup(&backup, &destination)
            .await
            .unwrap();

        assert!(!backup.exists());
        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "previous");
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            FsArchiver::staging_path(Path::new("/archive/a.mov")),
            PathBuf::from("/archive/.a.mov.partial")
        );
    }

    #[tokio::test]
    async fn test_validate_creates_archive_dir() {
        let d = dirs().await;
        let archiver = FsArchiver::new(ArchiverConfig::new(&d.archive));
        tokio_test::assert_ok!(archiver.validate().await);
        assert!(d.archive.is_dir());
    }
}
