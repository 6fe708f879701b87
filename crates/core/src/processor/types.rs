//! Types for the processor module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::archiver::ArchiveOutcome;
use crate::discovery::WorkItem;

/// The step of the per-item lifecycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Probe,
    Convert,
    Relocate,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::Convert => write!(f, "convert"),
            Self::Relocate => write!(f, "relocate"),
        }
    }
}

/// A source file that went through the whole lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedFile {
    /// Job ID used for the conversion.
    pub job_id: String,
    /// Converted file.
    pub output_path: PathBuf,
    /// Size of the converted file in bytes.
    pub output_size_bytes: u64,
    /// Where the source went.
    pub archive: ArchiveOutcome,
    /// Wall time of the conversion in milliseconds.
    pub conversion_ms: u64,
}

/// What happened to one work item.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// Converted and archived.
    Converted {
        item: WorkItem,
        converted: ConvertedFile,
    },
    /// Abandoned at `stage`; the source is left where it was found.
    Failed {
        item: WorkItem,
        stage: PipelineStage,
        error: String,
        /// The file itself cannot be converted; retrying it unchanged is pointless.
        unconvertible: bool,
    },
}

impl ItemOutcome {
    /// The item this outcome is about.
    pub fn item(&self) -> &WorkItem {
        match self {
            Self::Converted { item, .. } | Self::Failed { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Summary of one drained queue.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Per-item outcomes in processing order.
    pub outcomes: Vec<ItemOutcome>,
    /// When the batch started.
    pub started_at: DateTime<Utc>,
    /// When the last item finished.
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Number of items processed.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of items converted and archived.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of items that failed at any stage.
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Items that failed, in processing order.
    pub fn failed_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(ItemOutcome::item)
    }

    /// Failed items whose failure came from the file rather than the
    /// engine or the file system.
    pub fn unconvertible_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Failed {
                item,
                unconvertible: true,
                ..
            } => Some(item),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::MoveMethod;

    fn converted(name: &str) -> ItemOutcome {
        ItemOutcome::Converted {
            item: WorkItem::new(format!("/src/{}", name)),
            converted: ConvertedFile {
                job_id: "job".to_string(),
                output_path: PathBuf::from("/out/x.ts"),
                output_size_bytes: 10,
                archive: ArchiveOutcome {
                    source: PathBuf::from(format!("/src/{}", name)),
                    destination: PathBuf::from(format!("/archive/{}", name)),
                    backup: None,
                    method: MoveMethod::Rename,
                    size_bytes: 10,
                },
                conversion_ms: 5,
            },
        }
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let report = BatchReport {
            outcomes: vec![
                converted("a.mov"),
                ItemOutcome::Failed {
                    item: WorkItem::new("/src/b.mov"),
                    stage: PipelineStage::Probe,
                    error: "no audio".to_string(),
                    unconvertible: true,
                },
                converted("c.mov"),
                ItemOutcome::Failed {
                    item: WorkItem::new("/src/d.mov"),
                    stage: PipelineStage::Relocate,
                    error: "disk full".to_string(),
                    unconvertible: false,
                },
            ],
            started_at: now,
            finished_at: now,
        };

        assert_eq!(report.total(), 4);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
        let failed: Vec<_> = report.failed_items().map(|i| i.name.as_str()).collect();
        assert_eq!(failed, vec!["b.mov", "d.mov"]);
        let unconvertible: Vec<_> = report
            .unconvertible_items()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(unconvertible, vec!["b.mov"]);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Probe.to_string(), "probe");
        assert_eq!(PipelineStage::Relocate.to_string(), "relocate");
    }
}
