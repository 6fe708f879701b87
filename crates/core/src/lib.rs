pub mod archiver;
pub mod config;
pub mod converter;
pub mod discovery;
pub mod orchestrator;
pub mod processor;
pub mod testing;

pub use archiver::{ArchiveOutcome, Archiver, ArchiverConfig, ArchiverError, FsArchiver};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{
    ConversionJob, Converter, ConverterConfig, ConverterError, EncodingSettings, EngineInfo,
    FfmpegConverter, ProgressEvent,
};
pub use discovery::{DirScanner, DiscoveryConfig, DiscoveryError, Scanner, WorkItem, WorkQueue};
pub use orchestrator::{CycleOutcome, LoopState, OrchestratorConfig, OrchestratorStatus, WatchLoop};
pub use processor::{
    BatchProcessor, BatchReport, ItemOutcome, PipelineError, ProcessorConfig, ProgressCallback,
};
