//! Error types for the discovery module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while listing the source directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The source directory does not exist.
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The source path exists but is not a directory.
    #[error("Source path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The directory could not be read.
    #[error("Failed to read source directory {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DiscoveryError {
    /// Maps an I/O error on the source directory to a discovery error.
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::SourceNotFound { path }
        } else {
            Self::ReadFailed {
                path,
                source: error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = DiscoveryError::from_io(
            PathBuf::from("/missing"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, DiscoveryError::SourceNotFound { .. }));
        assert_eq!(err.to_string(), "Source directory not found: /missing");
    }

    #[test]
    fn test_from_io_permission_denied() {
        let err = DiscoveryError::from_io(
            PathBuf::from("/locked"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, DiscoveryError::ReadFailed { .. }));
    }
}
