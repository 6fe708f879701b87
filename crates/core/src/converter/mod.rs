//! Converter module: the adapter around the external transcoding engine.
//!
//! This module provides the `Converter` trait and an FFmpeg implementation
//! that probes media files for their streams and transcodes exactly one video
//! and one audio stream into the target container.
//!
//! # Features
//!
//! - Stream probing via ffprobe (all video and audio streams, in order)
//! - Single-stream mapping with a fixed encoder configuration
//! - Optional rotation and fixed-size scaling of the video stream
//! - Progress reporting during conversion over a channel
//! - Engine version and encoder detection at startup
//!
//! # Example
//!
//! ```ignore
//! use transcoder_core::converter::{Converter, ConversionJob, EncodingSettings, FfmpegConverter};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let info = converter.probe(Path::new("/movies/a.mov")).await?;
//! let job = ConversionJob {
//!     job_id: "job-1".to_string(),
//!     input_path: PathBuf::from("/movies/a.mov"),
//!     output_path: PathBuf::from("/movies/out/a.ts"),
//!     video_stream: info.first_video().cloned().unwrap(),
//!     audio_stream: info.first_audio().cloned().unwrap(),
//!     duration_secs: info.duration_secs,
//!     settings: EncodingSettings::default(),
//! };
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let result = converter.convert_with_progress(job, tx).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use capabilities::EngineInfo;
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{
    format_hms, AudioStream, ConversionJob, ConversionResult, EncodingSettings, MediaInfo,
    Preset, ProgressEvent, Rotation, VideoFormat, VideoSize, VideoStream,
};
