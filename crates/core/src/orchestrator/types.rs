//! Types for the watch loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Listing the source directory or processing a batch.
    Scanning,
    /// Waiting for the idle interval to elapse.
    Idle,
    /// Not running.
    #[default]
    Stopped,
}

/// Result of one scan-and-process cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to convert.
    Idle,
    /// A batch was processed.
    Processed { converted: usize, failed: usize },
    /// The source directory could not be listed.
    DiscoveryFailed(String),
}

impl CycleOutcome {
    /// How long to wait before the next cycle. `None` means scan again now.
    ///
    /// A batch in which nothing converted waits like an empty scan, so a
    /// failing engine or archive is retried at the idle interval.
    pub fn delay_after(&self, idle_interval: Duration) -> Option<Duration> {
        match self {
            Self::Processed {
                converted: 0,
                failed,
            } if *failed > 0 => Some(idle_interval),
            Self::Processed { .. } => None,
            Self::Idle | Self::DiscoveryFailed(_) => Some(idle_interval),
        }
    }
}

/// Current status of the watch loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the loop is running.
    pub running: bool,
    /// Current state.
    pub state: LoopState,
    /// Cycles started since the loop was created.
    pub cycles: u64,
    /// Files converted and archived.
    pub files_converted: u64,
    /// Files that failed at any stage.
    pub files_failed: u64,
    /// Failed files currently skipped by discovery.
    pub quarantined: usize,
    /// When the last cycle started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_after() {
        let idle = Duration::from_secs(60);
        assert_eq!(CycleOutcome::Idle.delay_after(idle), Some(idle));
        assert_eq!(
            CycleOutcome::DiscoveryFailed("missing".to_string()).delay_after(idle),
            Some(idle)
        );
        assert_eq!(
            CycleOutcome::Processed {
                converted: 0,
                failed: 3
            }
            .delay_after(idle),
            Some(idle)
        );
        assert_eq!(
            CycleOutcome::Processed {
                converted: 1,
                failed: 3
            }
            .delay_after(idle),
            None
        );
    }

    #[test]
    fn test_status_default() {
        let status = OrchestratorStatus::default();
        assert!(!status.running);
        assert_eq!(status.state, LoopState::Stopped);
        assert_eq!(status.cycles, 0);
    }

    #[test]
    fn test_status_serialization() {
        let status = OrchestratorStatus {
            running: true,
            state: LoopState::Idle,
            ..Default::default()
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"idle\""));
        assert!(!json.contains("last_cycle_at"));
    }
}
