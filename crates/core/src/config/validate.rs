use super::{types::Config, ConfigError};
use crate::converter::VideoFormat;

/// Validate configuration
/// Currently validates:
/// - Source, output and archive directories are pairwise distinct
/// - Target extension is not empty
/// - Idle interval is not 0
/// - Backup directory name is a single path component
/// - No video filters are combined with stream copy
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let source = &config.discovery.source_dir;
    let output = &config.processor.output_dir;
    let archive = &config.archive.archive_dir;

    if source == output || source == archive || output == archive {
        return Err(ConfigError::ValidationError(
            "discovery.source_dir, processor.output_dir and archive.archive_dir must all differ"
                .to_string(),
        ));
    }

    if config.processor.extension().is_empty() {
        return Err(ConfigError::ValidationError(
            "processor.target_extension cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.idle_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.idle_interval_secs cannot be 0".to_string(),
        ));
    }

    let backup = &config.archive.backup_dir_name;
    if backup.is_empty() || backup.contains(['/', '\\']) || backup == "." || backup == ".." {
        return Err(ConfigError::ValidationError(format!(
            "archive.backup_dir_name must be a plain directory name, got {:?}",
            backup
        )));
    }

    if config.archive.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "archive.buffer_size cannot be 0".to_string(),
        ));
    }

    let encoding = &config.processor.encoding;
    if encoding.video_codec == VideoFormat::Copy && encoding.video_filter().is_some() {
        return Err(ConfigError::ValidationError(
            "processor.encoding rotation/size cannot be used with video_codec = \"copy\""
                .to_string(),
        ));
    }

    Ok(())
}
