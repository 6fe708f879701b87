//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{
    AudioStream, ConversionJob, ConversionResult, MediaInfo, ProgressEvent, VideoFormat,
    VideoStream,
};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Returns the converter configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for a job.
    ///
    /// Exactly the two selected streams are mapped into the output.
    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        let settings = &job.settings;

        let mut args = vec![
            if settings.overwrite { "-y" } else { "-n" }.to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-map".to_string(),
            format!("0:{}", job.video_stream.index),
            "-map".to_string(),
            format!("0:{}", job.audio_stream.index),
        ];

        // Video codec
        args.extend([
            "-c:v".to_string(),
            settings.video_codec.ffmpeg_codec().to_string(),
        ]);

        if settings.video_codec != VideoFormat::Copy {
            if settings.video_codec.supports_preset() {
                args.extend(["-preset".to_string(), settings.preset.ffmpeg_name().to_string()]);
            }
            if let Some(filter) = settings.video_filter() {
                args.extend(["-vf".to_string(), filter]);
            }
        }

        // Audio codec
        if let Some(ref codec) = settings.audio_codec {
            args.extend(["-c:a".to_string(), codec.clone()]);
        }

        if !settings.multithreading {
            args.extend(["-threads".to_string(), "1".to_string()]);
        }

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        // Output
        args.push(job.output_path.to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            index: u32,
            codec_type: String,
            codec_name: Option<String>,
            bit_rate: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u8>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ConverterError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        let video_streams: Vec<VideoStream> = probe
            .streams
            .iter()
            .filter(|s| s.codec_type == "video")
            .map(|s| VideoStream {
                index: s.index,
                codec: s.codec_name.clone(),
                width: s.width,
                height: s.height,
                fps: s.r_frame_rate.as_deref().and_then(parse_frame_rate),
            })
            .collect();

        let audio_streams: Vec<AudioStream> = probe
            .streams
            .iter()
            .filter(|s| s.codec_type == "audio")
            .map(|s| AudioStream {
                index: s.index,
                codec: s.codec_name.clone(),
                sample_rate: s.sample_rate.as_ref().and_then(|r| r.parse::<u32>().ok()),
                channels: s.channels,
                bitrate_kbps: s
                    .bit_rate
                    .as_ref()
                    .and_then(|b| b.parse::<u32>().ok())
                    .map(|b| b / 1000),
            })
            .collect();

        if video_streams.is_empty() && audio_streams.is_empty() {
            return Err(ConverterError::NoStreams {
                path: path.to_path_buf(),
            });
        }

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_streams,
            audio_streams,
        })
    }

    /// Runs ffmpeg for `job`, throttling progress events to the configured interval.
    async fn run_conversion(
        &self,
        job: &ConversionJob,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        // Ensure output directory exists
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let args = self.build_args(job);
        let ffmpeg = self.config.ffmpeg_binary();
        debug!("Running {} {}", ffmpeg.display(), args.join(" "));

        let mut child = Command::new(&ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound { path: ffmpeg.clone() }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::conversion_failed("stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"^out_time_(?:ms|us)=(\d+)").ok();
        let progress_interval = Duration::from_millis(self.config.progress_interval_ms);
        let total_secs = job.duration_secs;

        let work = async {
            let mut current_time = 0.0;
            let mut last_progress_send: Option<Instant> = None;
            let mut error_output = String::new();

            while let Some(line) = reader.next_line().await? {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                // out_time_ms is reported in microseconds
                if let Some(ref re) = time_regex {
                    if let Some(us) = re
                        .captures(&line)
                        .and_then(|caps| caps.get(1))
                        .and_then(|m| m.as_str().parse::<f64>().ok())
                    {
                        current_time = us / 1_000_000.0;
                    }
                }

                let finished = line.trim() == "progress=end";
                let due = last_progress_send
                    .map(|t| t.elapsed() >= progress_interval)
                    .unwrap_or(true);
                if finished || (due && line.starts_with("progress=")) {
                    let elapsed = if finished { total_secs } else { current_time };
                    // Non-blocking send
                    let _ = progress_tx.try_send(ProgressEvent::new(
                        &job.job_id,
                        elapsed,
                        total_secs,
                    ));
                    last_progress_send = Some(Instant::now());
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        };

        let outcome = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), work).await,
            None => Ok(work.await),
        };

        let (status, error_output) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs.unwrap_or_default(),
                });
            }
        };
        if !status.success() {
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            if den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.parse::<f32>().ok(),
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let ffprobe = self.config.ffprobe_binary();
        let output = Command::new(&ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfprobeNotFound { path: ffprobe.clone() }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job, progress_tx).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let ffmpeg = self.config.ffmpeg_binary();
        if let Err(e) = Command::new(&ffmpeg).arg("-version").output().await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound { path: ffmpeg });
            }
            return Err(ConverterError::Io(e));
        }

        let ffprobe = self.config.ffprobe_binary();
        if let Err(e) = Command::new(&ffprobe).arg("-version").output().await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfprobeNotFound { path: ffprobe });
            }
            return Err(ConverterError::Io(e));
        }

        Ok(())
    }
}
