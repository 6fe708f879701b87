//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing or converting.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The engine found no decodable stream in the input.
    #[error("No decodable streams in {path}")]
    NoStreams { path: PathBuf },

    /// The input has no video stream.
    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    /// The input has no audio stream.
    #[error("No audio stream in {path}")]
    NoAudioStream { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The configured encoder is not compiled into the engine.
    #[error("Encoder not available: {encoder}")]
    EncoderUnavailable { encoder: String },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Whether the input file itself is unusable, as opposed to an engine
    /// or environment failure.
    pub fn is_input_problem(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound { .. }
                | Self::ProbeFailed { .. }
                | Self::NoStreams { .. }
                | Self::NoVideoStream { .. }
                | Self::NoAudioStream { .. }
                | Self::ParseError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConverterError::NoAudioStream {
            path: PathBuf::from("/src/silent.mov"),
        };
        assert_eq!(err.to_string(), "No audio stream in /src/silent.mov");

        let err = ConverterError::conversion_failed("FFmpeg exited with code: Some(1)", None);
        assert_eq!(
            err.to_string(),
            "Conversion failed: FFmpeg exited with code: Some(1)"
        );
    }

    #[test]
    fn test_is_input_problem() {
        assert!(ConverterError::NoVideoStream {
            path: PathBuf::from("a")
        }
        .is_input_problem());
        assert!(!ConverterError::FfmpegNotFound {
            path: PathBuf::from("ffmpeg")
        }
        .is_input_problem());
        assert!(!ConverterError::Timeout { timeout_secs: 5 }.is_input_problem());
        assert!(!ConverterError::OutputDirectoryFailed {
            path: PathBuf::from("/out")
        }
        .is_input_problem());
        assert!(ConverterError::probe_failed("Invalid data found").is_input_problem());
    }
}
