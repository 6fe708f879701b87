//! Configuration for the processor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::EncodingSettings;

/// Configuration for the conversion orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Directory receiving converted files.
    pub output_dir: PathBuf,

    /// Extension (container) of converted files, without the leading dot.
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// Encoder configuration applied to every job.
    #[serde(default)]
    pub encoding: EncodingSettings,
}

fn default_target_extension() -> String {
    "ts".to_string()
}

impl ProcessorConfig {
    /// Creates a config writing into `output_dir` with default settings.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_extension: default_target_extension(),
            encoding: EncodingSettings::default(),
        }
    }

    /// Sets the target extension.
    pub fn with_target_extension(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = extension.into();
        self
    }

    /// Sets the encoding settings.
    pub fn with_encoding(mut self, encoding: EncodingSettings) -> Self {
        self.encoding = encoding;
        self
    }

    /// Target extension with any leading dot removed.
    pub fn extension(&self) -> &str {
        self.target_extension.trim_start_matches('.')
    }
}
