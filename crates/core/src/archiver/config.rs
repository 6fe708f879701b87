//! Configuration for the archiver module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the file system archiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    /// Directory receiving converted originals.
    pub archive_dir: PathBuf,

    /// Name of the subdirectory holding displaced files.
    #[serde(default = "default_backup_dir_name")]
    pub backup_dir_name: String,

    /// Whether to verify checksums when a move falls back to copying.
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_backup_dir_name() -> String {
    "backup".to_string()
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

impl ArchiverConfig {
    /// Creates a config archiving into `archive_dir` with default settings.
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            backup_dir_name: default_backup_dir_name(),
            verify_checksums: true,
            buffer_size: default_buffer_size(),
        }
    }

    /// Enables or disables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Directory where displaced files are kept.
    pub fn backup_dir(&self) -> PathBuf {
        self.archive_dir.join(&self.backup_dir_name)
    }
}
