//! Batch processor implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::archiver::{ArchiveOutcome, Archiver, ArchiverError};
use crate::converter::{
    ConversionJob, ConversionResult, Converter, ConverterError, ProgressEvent,
};
use crate::discovery::{WorkItem, WorkQueue};

use super::config::ProcessorConfig;
use super::types::{BatchReport, ConvertedFile, ItemOutcome, PipelineStage};

/// Capacity of the per-job progress channel. The engine side uses
/// `try_send`, so a full channel drops events instead of stalling ffmpeg.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

/// Error type for a single item going through the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Probing failed or the streams needed are missing.
    #[error("Probe failed: {0}")]
    Probe(#[source] ConverterError),

    /// The engine failed to produce the output.
    #[error("Conversion failed: {0}")]
    Conversion(#[source] ConverterError),

    /// The source could not be archived.
    #[error("Relocation failed: {0}")]
    Relocation(#[source] ArchiverError),

    /// The relocation task died before reporting back.
    #[error("Relocation task aborted: {0}")]
    RelocationAborted(String),
}

impl PipelineError {
    /// Which lifecycle step produced this error.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Probe(_) => PipelineStage::Probe,
            Self::Conversion(_) => PipelineStage::Convert,
            Self::Relocation(_) | Self::RelocationAborted(_) => PipelineStage::Relocate,
        }
    }

    /// Whether the source file itself is unusable.
    pub fn is_input_problem(&self) -> bool {
        match self {
            Self::Probe(e) | Self::Conversion(e) => e.is_input_problem(),
            Self::Relocation(_) | Self::RelocationAborted(_) => false,
        }
    }
}

/// Callback invoked for every progress event, after it has been logged.
pub type ProgressCallback = Arc<dyn Fn(&WorkItem, &ProgressEvent) + Send + Sync>;

/// Drains a work queue one item at a time.
pub struct BatchProcessor<C: Converter, A: Archiver> {
    config: ProcessorConfig,
    converter: Arc<C>,
    archiver: Arc<A>,
    progress_callback: Option<ProgressCallback>,
}

impl<C: Converter + 'static, A: Archiver + 'static> BatchProcessor<C, A> {
    /// Creates a new batch processor.
    pub fn new(config: ProcessorConfig, converter: C, archiver: A) -> Self {
        Self {
            config,
            converter: Arc::new(converter),
            archiver: Arc::new(archiver),
            progress_callback: None,
        }
    }

    /// Sets a callback receiving every progress event.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Returns the processor configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Where the converted version of `item` is written.
    pub fn output_path_for(&self, item: &WorkItem) -> PathBuf {
        let stem = item
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| item.name.clone());
        self.config
            .output_dir
            .join(format!("{}.{}", stem, self.config.extension()))
    }

    /// Processes every item of the queue in order.
    ///
    /// Never fails as a whole: each item's result is recorded in the report.
    pub async fn process_batch(&self, mut queue: WorkQueue) -> BatchReport {
        let started_at = Utc::now();
        info!("Found {} files to convert.", queue.len());

        let mut outcomes = Vec::with_capacity(queue.len());
        while let Some(item) = queue.pop() {
            let outcome = match self.process_item(&item).await {
                Ok(converted) => ItemOutcome::Converted { item, converted },
                Err(e) => {
                    if e.is_input_problem() {
                        warn!("Skipping {}, not a convertible video: {}", item.name, e);
                    } else {
                        warn!("Failed to {} {}: {}", e.stage(), item.name, e);
                    }
                    ItemOutcome::Failed {
                        stage: e.stage(),
                        error: e.to_string(),
                        unconvertible: e.is_input_problem(),
                        item,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        debug!(
            "Batch done: {} converted, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Runs the full lifecycle for one item: probe, convert, archive.
    pub async fn process_item(&self, item: &WorkItem) -> Result<ConvertedFile, PipelineError> {
        let job = self.build_job(item).await?;
        let job_id = job.job_id.clone();

        debug!(
            "Converting {} (video stream {}, audio stream {}) to {}",
            item.name,
            job.video_stream.index,
            job.audio_stream.index,
            job.output_path.display()
        );

        let started = Instant::now();
        let result = self
            .run_job(item, job)
            .await
            .map_err(PipelineError::Conversion)?;
        let conversion_ms = started.elapsed().as_millis() as u64;

        let archive = self.relocate(item).await?;
        info!("Finished conversion of file [{}]", item.name);

        Ok(ConvertedFile {
            job_id,
            output_path: result.output_path,
            output_size_bytes: result.output_size_bytes,
            archive,
            conversion_ms,
        })
    }

    /// Probes the item and selects its first video and first audio stream.
    async fn build_job(&self, item: &WorkItem) -> Result<ConversionJob, PipelineError> {
        let info = self
            .converter
            .probe(&item.path)
            .await
            .map_err(PipelineError::Probe)?;

        let video_stream = info.first_video().cloned().ok_or_else(|| {
            PipelineError::Probe(ConverterError::NoVideoStream {
                path: item.path.clone(),
            })
        })?;
        let audio_stream = info.first_audio().cloned().ok_or_else(|| {
            PipelineError::Probe(ConverterError::NoAudioStream {
                path: item.path.clone(),
            })
        })?;

        Ok(ConversionJob {
            job_id: Uuid::new_v4().to_string(),
            input_path: item.path.clone(),
            output_path: self.output_path_for(item),
            video_stream,
            audio_stream,
            duration_secs: info.duration_secs,
            settings: self.config.encoding.clone(),
        })
    }

    /// Runs the conversion while draining its progress channel.
    async fn run_job(
        &self,
        item: &WorkItem,
        job: ConversionJob,
    ) -> Result<ConversionResult, ConverterError> {
        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let conversion = self.converter.convert_with_progress(job, progress_tx);
        tokio::pin!(conversion);

        loop {
            tokio::select! {
                result = &mut conversion => {
                    while let Ok(event) = progress_rx.try_recv() {
                        self.report_progress(item, &event);
                    }
                    return result;
                }
                Some(event) = progress_rx.recv() => {
                    self.report_progress(item, &event);
                }
            }
        }
    }

    fn report_progress(&self, item: &WorkItem, event: &ProgressEvent) {
        info!("{}", event.display_line(&item.name));
        if let Some(ref callback) = self.progress_callback {
            callback(item, event);
        }
    }

    /// Archives the source in a detached task so that dropping the batch
    /// future never leaves a move half-done.
    async fn relocate(&self, item: &WorkItem) -> Result<ArchiveOutcome, PipelineError> {
        let archiver = Arc::clone(&self.archiver);
        let owned = item.clone();
        let handle = tokio::spawn(async move { archiver.archive(&owned).await });

        match handle.await {
            Ok(result) => result.map_err(PipelineError::Relocation),
            Err(e) => Err(PipelineError::RelocationAborted(e.to_string())),
        }
    }
}
