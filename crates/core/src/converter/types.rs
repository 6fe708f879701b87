//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Video codec used for the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    /// VP9
    Vp9,
    /// AV1
    Av1,
    /// Copy (no re-encoding)
    Copy,
}

impl VideoFormat {
    /// Returns the ffmpeg codec name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
            Self::Av1 => "libaom-av1",
            Self::Copy => "copy",
        }
    }

    /// Whether the encoder understands x264-style `-preset` names.
    pub fn supports_preset(&self) -> bool {
        matches!(self, Self::H264 | Self::H265)
    }
}

/// Speed/quality tradeoff passed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Fastest encoding, largest output.
    #[default]
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    /// Slowest encoding, smallest output.
    Veryslow,
}

impl Preset {
    /// Returns the ffmpeg preset name.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
        }
    }
}

/// Fixed output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSize {
    /// 852x480
    Hd480,
    /// 1280x720
    Hd720,
    /// 1920x1080
    Hd1080,
}

impl VideoSize {
    /// Returns (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Hd480 => (852, 480),
            Self::Hd720 => (1280, 720),
            Self::Hd1080 => (1920, 1080),
        }
    }

    fn filter(&self) -> String {
        let (w, h) = self.dimensions();
        format!("scale={}:{}", w, h)
    }
}

/// Rotation applied to the video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
    UpsideDown,
}

impl Rotation {
    fn filter(&self) -> &'static str {
        match self {
            Self::Clockwise => "transpose=1",
            Self::CounterClockwise => "transpose=2",
            Self::UpsideDown => "transpose=2,transpose=2",
        }
    }
}

/// Encoding configuration shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Target video codec.
    #[serde(default = "default_video_codec")]
    pub video_codec: VideoFormat,
    /// Target audio codec (ffmpeg encoder name); container default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Encoder preset.
    #[serde(default)]
    pub preset: Preset,
    /// Allow the encoder to use more than one thread.
    #[serde(default)]
    pub multithreading: bool,
    /// Replace an existing output file.
    #[serde(default = "default_true")]
    pub overwrite: bool,
    /// Scale the video to a fixed size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<VideoSize>,
    /// Rotate the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
}

fn default_video_codec() -> VideoFormat {
    VideoFormat::H264
}

fn default_true() -> bool {
    true
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: None,
            preset: Preset::default(),
            multithreading: false,
            overwrite: true,
            size: None,
            rotation: None,
        }
    }
}

impl EncodingSettings {
    /// Builds the `-vf` filter chain, if any filter is configured.
    pub fn video_filter(&self) -> Option<String> {
        let mut filters = Vec::new();
        if let Some(rotation) = self.rotation {
            filters.push(rotation.filter().to_string());
        }
        if let Some(size) = self.size {
            filters.push(size.filter());
        }
        if filters.is_empty() {
            None
        } else {
            Some(filters.join(","))
        }
    }
}

/// A video stream reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    /// Absolute stream index in the input container.
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
}

/// An audio stream reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    /// Absolute stream index in the input container.
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mov", "matroska").
    pub format: String,
    /// Video streams in container order.
    pub video_streams: Vec<VideoStream>,
    /// Audio streams in container order.
    pub audio_streams: Vec<AudioStream>,
}

impl MediaInfo {
    /// First video stream, if any.
    pub fn first_video(&self) -> Option<&VideoStream> {
        self.video_streams.first()
    }

    /// First audio stream, if any.
    pub fn first_audio(&self) -> Option<&AudioStream> {
        self.audio_streams.first()
    }
}

/// A conversion job request.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Unique job ID, used to correlate progress and log lines.
    pub job_id: String,
    /// Input file path.
    pub input_path: PathBuf,
    /// Output file path.
    pub output_path: PathBuf,
    /// The single video stream to encode.
    pub video_stream: VideoStream,
    /// The single audio stream to encode.
    pub audio_stream: AudioStream,
    /// Input duration in seconds, used for percent calculation.
    pub duration_secs: f64,
    /// Encoding configuration.
    pub settings: EncodingSettings,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Job ID.
    pub job_id: String,
    /// Output file path.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Conversion duration in milliseconds.
    pub duration_ms: u64,
}

/// Progress snapshot emitted while a job runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Job ID.
    pub job_id: String,
    /// Media time encoded so far.
    pub elapsed: Duration,
    /// Total media time of the input.
    pub total: Duration,
    /// Progress percentage (0.0 - 100.0).
    pub percent: f32,
}

impl ProgressEvent {
    /// Builds an event from encoded and total seconds.
    pub fn new(job_id: impl Into<String>, elapsed_secs: f64, total_secs: f64) -> Self {
        let elapsed_secs = elapsed_secs.max(0.0);
        let total_secs = total_secs.max(0.0);
        let percent = if total_secs.is_finite() && total_secs > 0.0 {
            (elapsed_secs / total_secs * 100.0).min(100.0) as f32
        } else {
            0.0
        };
        Self {
            job_id: job_id.into(),
            elapsed: Duration::try_from_secs_f64(elapsed_secs).unwrap_or_default(),
            total: Duration::try_from_secs_f64(total_secs).unwrap_or_default(),
            percent,
        }
    }

    /// Console line for this event: `[elapsed/total][percent%] name`.
    pub fn display_line(&self, file_name: &str) -> String {
        format!(
            "[{}/{}][{:.0}%] {}",
            format_hms(self.elapsed),
            format_hms(self.total),
            self.percent,
            file_name
        )
    }
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_format_codec() {
        assert_eq!(VideoFormat::H264.ffmpeg_codec(), "libx264");
        assert_eq!(VideoFormat::H265.ffmpeg_codec(), "libx265");
        assert_eq!(VideoFormat::Copy.ffmpeg_codec(), "copy");
        assert!(VideoFormat::H264.supports_preset());
        assert!(!VideoFormat::Copy.supports_preset());
    }

    #[test]
    fn test_default_settings_are_fast_and_single_threaded() {
        let settings = EncodingSettings::default();
        assert_eq!(settings.video_codec, VideoFormat::H264);
        assert_eq!(settings.preset, Preset::Ultrafast);
        assert!(!settings.multithreading);
        assert!(settings.overwrite);
        assert!(settings.video_filter().is_none());
    }

    #[test]
    fn test_video_filter_chain() {
        let settings = EncodingSettings {
            size: Some(VideoSize::Hd480),
            rotation: Some(Rotation::CounterClockwise),
            ..Default::default()
        };
        assert_eq!(
            settings.video_filter().as_deref(),
            Some("transpose=2,scale=852:480")
        );
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let toml = r#"
            preset = "medium"
            size = "hd720"
        "#;
        let settings: EncodingSettings = toml::from_str(toml).unwrap();
        assert_eq!(settings.preset, Preset::Medium);
        assert_eq!(settings.size, Some(VideoSize::Hd720));
        assert_eq!(settings.video_codec, VideoFormat::H264);
        assert!(settings.overwrite);
    }

    #[test]
    fn test_progress_percent() {
        let event = ProgressEvent::new("job", 30.0, 120.0);
        assert!((event.percent - 25.0).abs() < f32::EPSILON);
        assert_eq!(event.elapsed, Duration::from_secs(30));

        let over = ProgressEvent::new("job", 130.0, 120.0);
        assert_eq!(over.percent, 100.0);

        let unknown = ProgressEvent::new("job", 10.0, 0.0);
        assert_eq!(unknown.percent, 0.0);
    }

    #[test]
    fn test_progress_with_unbounded_durations() {
        let event = ProgressEvent::new("job", 10.0, f64::INFINITY);
        assert_eq!(event.percent, 0.0);
        assert_eq!(event.total, Duration::ZERO);

        let event = ProgressEvent::new("job", f64::INFINITY, f64::INFINITY);
        assert_eq!(event.elapsed, Duration::ZERO);
        assert_eq!(event.percent, 0.0);

        let event = ProgressEvent::new("job", 1e300, 120.0);
        assert_eq!(event.elapsed, Duration::ZERO);
        assert_eq!(event.percent, 100.0);
    }

    #[test]
    fn test_progress_display_line() {
        let event = ProgressEvent::new("job", 62.0, 3725.0);
        assert_eq!(event.display_line("a.mov"), "[00:01:02/01:02:05][2%] a.mov");
    }

    #[test]
    fn test_media_info_first_streams() {
        let info = MediaInfo {
            path: PathBuf::from("a.mov"),
            size_bytes: 0,
            duration_secs: 1.0,
            format: "mov".to_string(),
            video_streams: vec![],
            audio_streams: vec![AudioStream {
                index: 3,
                codec: None,
                sample_rate: None,
                channels: None,
                bitrate_kbps: None,
            }],
        };
        assert!(info.first_video().is_none());
        assert_eq!(info.first_audio().map(|a| a.index), Some(3));
    }
}
