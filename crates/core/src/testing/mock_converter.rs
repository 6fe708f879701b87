//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

use super::fixtures;
use crate::converter::{
    ConversionJob, ConversionResult, Converter, ConverterError, MediaInfo, ProgressEvent,
};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
    /// When the conversion started (tokio clock).
    pub started_at: Instant,
    /// When the conversion returned (tokio clock).
    pub finished_at: Instant,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs, with timing, for assertions
/// - Simulate probe and conversion failures per input path
/// - Control probe results (one video and one audio stream by default)
/// - Simulate progress updates
/// - Optionally write the output file so archiving can be tested end to end
///
/// Clones share state, so a test can keep one handle while the processor owns
/// another.
///
/// # Example
///
/// ```rust,ignore
/// use transcoder_core::testing::{fixtures, MockConverter};
///
/// let converter = MockConverter::new();
/// converter
///     .set_probe_result("/src/b.mov", fixtures::media_info("/src/b.mov", 1, 0))
///     .await;
///
/// // ... run a batch ...
///
/// let conversions = converter.recorded_conversions().await;
/// assert_eq!(conversions.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    probe_errors: Arc<RwLock<HashMap<PathBuf, String>>>,
    conversion_errors: Arc<RwLock<HashMap<PathBuf, String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    conversion_duration_ms: Arc<RwLock<u64>>,
    progress_steps: Arc<RwLock<u32>>,
    write_output: Arc<RwLock<bool>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            probe_errors: Arc::new(RwLock::new(HashMap::new())),
            conversion_errors: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(10)),
            progress_steps: Arc::new(RwLock::new(2)),
            write_output: Arc::new(RwLock::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Highest number of conversions that were running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Make probing `path` fail.
    pub async fn set_probe_error(&self, path: impl AsRef<Path>, reason: &str) {
        self.probe_errors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), reason.to_string());
    }

    /// Make converting the input `path` fail.
    pub async fn set_conversion_error(&self, path: impl AsRef<Path>, reason: &str) {
        self.conversion_errors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), reason.to_string());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Number of progress events sent per conversion.
    pub async fn set_progress_steps(&self, steps: u32) {
        *self.progress_steps.write().await = steps;
    }

    /// Write a small output file for every successful conversion.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, job: ConversionJob, success: bool, started_at: Instant) {
        self.conversions.write().await.push(RecordedConversion {
            job,
            success,
            started_at,
            finished_at: Instant::now(),
        });
    }

    async fn simulate(
        &self,
        job: &ConversionJob,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<u64, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let duration_ms = *self.conversion_duration_ms.read().await;
        let steps = *self.progress_steps.read().await;

        if steps > 0 {
            let step = Duration::from_millis(duration_ms / steps as u64);
            for i in 1..=steps {
                tokio::time::sleep(step).await;
                let elapsed = job.duration_secs * i as f64 / steps as f64;
                let _ = progress_tx
                    .send(ProgressEvent::new(
                        job.job_id.clone(),
                        elapsed,
                        job.duration_secs,
                    ))
                    .await;
            }
        } else if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(reason) = self.conversion_errors.read().await.get(&job.input_path) {
            return Err(ConverterError::conversion_failed(reason.clone(), None));
        }

        if *self.write_output.read().await {
            if let Some(parent) = job.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = format!("converted from {}", job.input_path.display());
            tokio::fs::write(&job.output_path, &content).await?;
            return Ok(content.len() as u64);
        }

        Ok(50 * 1024 * 1024)
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if let Some(reason) = self.probe_errors.read().await.get(path) {
            return Err(ConverterError::probe_failed(reason.clone()));
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }

        Ok(fixtures::media_info(path, 1, 1))
    }

    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<ConversionResult, ConverterError> {
        let started_at = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let outcome = self.simulate(&job, &progress_tx).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Ok(output_size_bytes) => {
                self.record(job.clone(), true, started_at).await;
                Ok(ConversionResult {
                    job_id: job.job_id,
                    output_path: job.output_path,
                    output_size_bytes,
                    duration_ms: started_at.elapsed().as_millis() as u64,
                })
            }
            Err(e) => {
                self.record(job, false, started_at).await;
                Err(e)
            }
        }
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
