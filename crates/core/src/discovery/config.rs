//! Configuration for the discovery module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the directory scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Directory whose entries are converted.
    pub source_dir: PathBuf,
}

impl DiscoveryConfig {
    /// Creates a config watching the given directory.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }
}
