//! Types for the archiver module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the file reached the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMethod {
    /// Same-filesystem rename.
    Rename,
    /// Verified copy followed by removal of the source.
    Copy,
}

/// Result of archiving one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    /// Where the file was taken from.
    pub source: PathBuf,
    /// Where the file now lives.
    pub destination: PathBuf,
    /// Where the previously archived file of the same name was moved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// How the move was performed.
    pub method: MoveMethod,
    /// Size of the archived file in bytes.
    pub size_bytes: u64,
}
