//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the watch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How long to wait before scanning again after an empty or failed scan
    /// (seconds).
    #[serde(default = "default_idle_interval")]
    pub idle_interval_secs: u64,

    /// Skip items that already failed until their file changes.
    /// When disabled, a failing file is retried on every scan.
    #[serde(default = "default_true")]
    pub quarantine_failed: bool,
}

fn default_idle_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            idle_interval_secs: default_idle_interval(),
            quarantine_failed: true,
        }
    }
}

impl OrchestratorConfig {
    /// Sets the idle interval in seconds.
    pub fn with_idle_interval(mut self, secs: u64) -> Self {
        self.idle_interval_secs = secs;
        self
    }

    /// Enables or disables the failure quarantine.
    pub fn with_quarantine(mut self, enabled: bool) -> Self {
        self.quarantine_failed = enabled;
        self
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.idle_interval(), Duration::from_secs(60));
        assert!(config.quarantine_failed);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: OrchestratorConfig = toml::from_str("idle_interval_secs = 5").unwrap();
        assert_eq!(config.idle_interval_secs, 5);
        assert!(config.quarantine_failed);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            idle_interval_secs = 300
            quarantine_failed = false
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.idle_interval_secs, 300);
        assert!(!config.quarantine_failed);
    }
}
