//! Trait definitions for the archiver module.

use async_trait::async_trait;

use super::error::ArchiverError;
use super::types::ArchiveOutcome;
use crate::discovery::WorkItem;

/// Moves converted source files out of the watched directory.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Returns the name of this archiver implementation.
    fn name(&self) -> &str;

    /// Moves the item's file into the archive, backing up any file already
    /// archived under the same name.
    async fn archive(&self, item: &WorkItem) -> Result<ArchiveOutcome, ArchiverError>;

    /// Validates that the archiver is properly configured and ready.
    async fn validate(&self) -> Result<(), ArchiverError>;
}
