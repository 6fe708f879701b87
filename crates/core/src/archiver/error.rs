//! Error types for the archiver module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while archiving a source file.
///
/// Every variant leaves the file recoverable: either still at its source
/// path, or at a destination or backup path named in the error.
#[derive(Debug, Error)]
pub enum ArchiverError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create the archive or backup directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the previously archived file into the backup directory.
    #[error("Failed to back up {existing} to {backup}")]
    BackupFailed {
        existing: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Checksum verification failed.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Replacement failed and the backup could not be moved back.
    #[error("Failed to restore {destination} from {backup}: {reason}")]
    RollbackFailed {
        destination: PathBuf,
        backup: PathBuf,
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiverError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiverError::move_failed(
            PathBuf::from("/src/a.mov"),
            PathBuf::from("/archive/a.mov"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(
            err.to_string(),
            "Failed to move file from /src/a.mov to /archive/a.mov"
        );
    }
}
