use serde::{Deserialize, Serialize};

use crate::archiver::ArchiverConfig;
use crate::converter::ConverterConfig;
use crate::discovery::DiscoveryConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::processor::ProcessorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Watched source directory.
    pub discovery: DiscoveryConfig,
    /// Output directory and encoding settings.
    pub processor: ProcessorConfig,
    /// Archive directory for converted originals.
    pub archive: ArchiverConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}
