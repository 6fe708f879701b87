//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult, MediaInfo, ProgressEvent};

/// The transcoding engine adapter.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Probes a media file for its streams.
    ///
    /// Fails with [`ConverterError::NoStreams`] when nothing decodable is found.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    /// Converts a media file according to the job, reporting progress.
    ///
    /// The progress sender will receive updates during conversion.
    /// If the receiver is dropped, conversion continues without progress reporting.
    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
