//! Trait definitions for the discovery module.

use async_trait::async_trait;

use super::error::DiscoveryError;
use super::types::WorkQueue;

/// Something that can produce the work for one cycle.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Returns the name of this scanner implementation.
    fn name(&self) -> &str;

    /// Lists the current work, in processing order.
    ///
    /// An unreachable source is an error, never an empty queue.
    async fn scan(&self) -> Result<WorkQueue, DiscoveryError>;
}
