//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the pipeline's seams
//! ([`Scanner`](crate::discovery::Scanner), [`Converter`](crate::converter::Converter),
//! [`Archiver`](crate::archiver::Archiver)), allowing the batch processor and
//! the watch loop to be tested without ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use transcoder_core::testing::{MockArchiver, MockConverter, MockScanner};
//!
//! let scanner = MockScanner::new();
//! let converter = MockConverter::new();
//! let archiver = MockArchiver::new();
//!
//! scanner.push_batch(vec![WorkItem::new("/src/a.mov")]).await;
//! converter.set_conversion_error("/src/a.mov", "codec error").await;
//! ```

mod mock_archiver;
mod mock_converter;
mod mock_scanner;

pub use mock_archiver::MockArchiver;
pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_scanner::MockScanner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::converter::{AudioStream, MediaInfo, VideoStream};
    use crate::discovery::WorkItem;

    /// Media info with `videos` video streams followed by `audios` audio
    /// streams, indexed in container order.
    pub fn media_info(path: impl AsRef<Path>, videos: u32, audios: u32) -> MediaInfo {
        let video_streams = (0..videos)
            .map(|index| VideoStream {
                index,
                codec: Some("h264".to_string()),
                width: Some(1920),
                height: Some(1080),
                fps: Some(24.0),
            })
            .collect();
        let audio_streams = (videos..videos + audios)
            .map(|index| AudioStream {
                index,
                codec: Some("aac".to_string()),
                sample_rate: Some(48000),
                channels: Some(2),
                bitrate_kbps: Some(192),
            })
            .collect();

        MediaInfo {
            path: path.as_ref().to_path_buf(),
            size_bytes: 100 * 1024 * 1024,
            duration_secs: 120.0,
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            video_streams,
            audio_streams,
        }
    }

    /// Writes `contents` to `dir/name` and returns the matching work item.
    pub async fn source_file(
        dir: impl AsRef<Path>,
        name: &str,
        contents: &str,
    ) -> std::io::Result<WorkItem> {
        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, contents).await?;
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(WorkItem::new(path).with_metadata(metadata.len(), metadata.modified().ok()))
    }
}
