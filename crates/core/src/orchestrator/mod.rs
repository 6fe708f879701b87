//! Idle/retry loop driving discovery and batch processing.
//!
//! The [`WatchLoop`] alternates between two states:
//! - **Scanning**: list the source directory and process everything found.
//!   After a batch it scans again right away, whatever the outcome.
//! - **Idle**: nothing to do (or discovery failed); wait for the configured
//!   interval, then scan again.
//!
//! The loop has no terminal state of its own. [`WatchLoop::stop`] ends it from
//! the outside, interrupting an idle wait immediately.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::WatchLoop;
pub use types::{CycleOutcome, LoopState, OrchestratorStatus};
