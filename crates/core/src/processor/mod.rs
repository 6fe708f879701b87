//! Processor module: the conversion orchestrator.
//!
//! A [`BatchProcessor`] drains one [`WorkQueue`](crate::discovery::WorkQueue)
//! strictly in order. For every item it:
//! - probes the source and selects the first video and first audio stream
//! - converts them into `output_dir/<stem>.<target_extension>`, reporting
//!   progress while the engine runs
//! - archives the source once the conversion has succeeded
//!
//! A failing item is reported in the [`BatchReport`] and the batch moves on.
//!
//! # Example
//!
//! ```ignore
//! use transcoder_core::processor::{BatchProcessor, ProcessorConfig};
//! use transcoder_core::converter::FfmpegConverter;
//! use transcoder_core::archiver::{ArchiverConfig, FsArchiver};
//!
//! let processor = BatchProcessor::new(
//!     ProcessorConfig::new("/movies/output"),
//!     FfmpegConverter::with_defaults(),
//!     FsArchiver::new(ArchiverConfig::new("/movies/archive")),
//! );
//!
//! let report = processor.process_batch(queue).await;
//! println!("{} converted, {} failed", report.succeeded(), report.failed());
//! ```

mod config;
mod pipeline;
mod types;

pub use config::ProcessorConfig;
pub use pipeline::{BatchProcessor, PipelineError, ProgressCallback};
pub use types::{BatchReport, ConvertedFile, ItemOutcome, PipelineStage};
