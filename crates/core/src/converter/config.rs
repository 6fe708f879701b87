//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Directory holding both engine executables. Takes precedence over the
    /// individual paths when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executables_dir: Option<PathBuf>,

    /// Timeout for a single conversion job in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments placed before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// Minimum interval between progress events in milliseconds.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_progress_interval() -> u64 {
    500
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            executables_dir: None,
            timeout_secs: None,
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            progress_interval_ms: default_progress_interval(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Looks for both executables inside `dir`.
    pub fn with_executables_dir(mut self, dir: PathBuf) -> Self {
        self.executables_dir = Some(dir);
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Effective ffmpeg executable.
    pub fn ffmpeg_binary(&self) -> PathBuf {
        self.resolve("ffmpeg", &self.ffmpeg_path)
    }

    /// Effective ffprobe executable.
    pub fn ffprobe_binary(&self) -> PathBuf {
        self.resolve("ffprobe", &self.ffprobe_path)
    }

    fn resolve(&self, name: &str, explicit: &Path) -> PathBuf {
        match &self.executables_dir {
            Some(dir) => dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX)),
            None => explicit.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.ffmpeg_binary(), PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_binary(), PathBuf::from("ffprobe"));
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.progress_interval_ms, 500);
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffprobe"),
        )
        .with_timeout(7200);

        assert_eq!(config.ffmpeg_binary(), PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.ffprobe_binary(), PathBuf::from("/usr/local/bin/ffprobe"));
        assert_eq!(config.timeout_secs, Some(7200));
    }

    #[test]
    fn test_executables_dir_takes_precedence() {
        let config = ConverterConfig::with_paths(
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffprobe"),
        )
        .with_executables_dir(PathBuf::from("/movies/FFmpeg"));

        let suffix = std::env::consts::EXE_SUFFIX;
        assert_eq!(
            config.ffmpeg_binary(),
            PathBuf::from(format!("/movies/FFmpeg/ffmpeg{}", suffix))
        );
        assert_eq!(
            config.ffprobe_binary(),
            PathBuf::from(format!("/movies/FFmpeg/ffprobe{}", suffix))
        );
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: ConverterConfig = toml::from_str("timeout_secs = 60").unwrap();
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.ffmpeg_log_level, "warning");
    }
}
