//! Engine version and encoder detection.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::types::VideoFormat;

/// What the installed engine reports about itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Version string from `ffmpeg -version` (e.g. "6.1.1").
    pub version: Option<String>,
    /// Names of the encoders compiled into ffmpeg.
    pub encoders: Vec<String>,
}

impl EngineInfo {
    /// Queries the configured ffmpeg for its version and encoder list.
    pub async fn detect(config: &ConverterConfig) -> Result<Self, ConverterError> {
        let ffmpeg = config.ffmpeg_binary();

        let version_out = run_ffmpeg(&ffmpeg, "-version").await?;
        let encoders_out = run_ffmpeg(&ffmpeg, "-encoders").await?;

        Ok(Self {
            version: parse_version(&version_out),
            encoders: parse_encoders(&encoders_out),
        })
    }

    /// Whether the named encoder (e.g. "libx264") is available.
    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.iter().any(|e| e == name)
    }

    /// Fails when the video codec cannot be produced by this engine.
    pub fn ensure_video_format(&self, format: VideoFormat) -> Result<(), ConverterError> {
        if format == VideoFormat::Copy || self.has_encoder(format.ffmpeg_codec()) {
            Ok(())
        } else {
            Err(ConverterError::EncoderUnavailable {
                encoder: format.ffmpeg_codec().to_string(),
            })
        }
    }
}

async fn run_ffmpeg(ffmpeg: &std::path::Path, flag: &str) -> Result<String, ConverterError> {
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConverterError::FfmpegNotFound {
                    path: ffmpeg.to_path_buf(),
                }
            } else {
                ConverterError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(ConverterError::probe_failed(format!(
            "ffmpeg {} exited with code: {:?}",
            flag,
            output.status.code()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Extracts the version from the first line of `ffmpeg -version`.
fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Extracts encoder names from `ffmpeg -encoders`.
///
/// Entries follow a ` ------` separator line and look like
/// ` V....D libx264              libx264 H.264 ...`.
fn parse_encoders(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            if flags.len() != 6 {
                return None;
            }
            parts.next().map(str::to_string)
        })
        .collect()
}
