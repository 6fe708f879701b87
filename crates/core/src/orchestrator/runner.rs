//! Watch loop implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::archiver::Archiver;
use crate::converter::Converter;
use crate::discovery::{Scanner, WorkItem, WorkQueue};
use crate::processor::{BatchProcessor, BatchReport};

use super::config::OrchestratorConfig;
use super::types::{CycleOutcome, LoopState, OrchestratorStatus};

/// The idle/retry loop: scan, process, repeat; wait when there is nothing to do.
pub struct WatchLoop<S, C, A>
where
    S: Scanner + 'static,
    C: Converter + 'static,
    A: Archiver + 'static,
{
    config: OrchestratorConfig,
    scanner: Arc<S>,
    processor: Arc<BatchProcessor<C, A>>,

    // Runtime state
    running: Arc<AtomicBool>,
    /// Set by `stop`, even before `run` has started.
    stop_requested: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    status: Arc<RwLock<OrchestratorStatus>>,
    /// Unconvertible items, matched by path, size and mtime.
    quarantine: Arc<RwLock<Vec<WorkItem>>>,
}

impl<S, C, A> WatchLoop<S, C, A>
where
    S: Scanner + 'static,
    C: Converter + 'static,
    A: Archiver + 'static,
{
    /// Create a new watch loop.
    pub fn new(config: OrchestratorConfig, scanner: S, processor: BatchProcessor<C, A>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            scanner: Arc::new(scanner),
            processor: Arc::new(processor),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: AtomicBool::new(false),
            shutdown_tx,
            status: Arc::new(RwLock::new(OrchestratorStatus::default())),
            quarantine: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Runs until [`stop`](Self::stop) is called.
    ///
    /// A stop request interrupts the idle wait at once. During a batch it
    /// abandons the running conversion; a relocation already underway
    /// completes in the background.
    pub async fn run(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Watch loop already running");
            return;
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.stop_requested.load(Ordering::SeqCst) {
            info!("Stop requested before the watch loop started");
            self.running.store(false, Ordering::SeqCst);
            self.set_state(LoopState::Stopped).await;
            return;
        }

        info!(
            "Watch loop started (scanner: {}, idle interval: {}s)",
            self.scanner.name(),
            self.config.idle_interval_secs
        );

        while self.running.load(Ordering::SeqCst) {
            let outcome = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Watch loop received shutdown signal during a cycle");
                    break;
                }
                outcome = self.run_cycle() => outcome,
            };

            let Some(delay) = outcome.delay_after(self.config.idle_interval()) else {
                continue;
            };

            self.set_state(LoopState::Idle).await;
            debug!("Next scan in {}s", delay.as_secs());
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Watch loop received shutdown signal while idle");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.set_state(LoopState::Stopped).await;
        info!("Watch loop stopped");
    }

    /// Stop the loop gracefully.
    ///
    /// A stop issued before [`run`](Self::run) starts makes it return at once.
    pub async fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Watch loop not running, stop recorded");
            return;
        }

        info!("Stopping watch loop");
        let _ = self.shutdown_tx.send(());
    }

    /// Get current loop status.
    pub async fn status(&self) -> OrchestratorStatus {
        let mut status = self.status.read().await.clone();
        status.running = self.running.load(Ordering::Relaxed);
        status.quarantined = self.quarantine.read().await.len();
        status
    }

    /// Runs a single scan-and-process cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        {
            let mut status = self.status.write().await;
            status.state = LoopState::Scanning;
            status.cycles += 1;
            status.last_cycle_at = Some(Utc::now());
        }

        let queue = match self.scanner.scan().await {
            Ok(queue) => queue,
            Err(e) => {
                warn!("Discovery failed, retrying after the idle interval: {}", e);
                return CycleOutcome::DiscoveryFailed(e.to_string());
            }
        };

        let queue = self.filter_quarantined(queue).await;
        if queue.is_empty() {
            debug!("No files to convert");
            return CycleOutcome::Idle;
        }

        let report = self.processor.process_batch(queue).await;
        self.record(&report).await;

        CycleOutcome::Processed {
            converted: report.succeeded(),
            failed: report.failed(),
        }
    }

    /// Drops quarantined items from the queue and forgets quarantine entries
    /// whose file changed or disappeared.
    async fn filter_quarantined(&self, mut queue: WorkQueue) -> WorkQueue {
        if !self.config.quarantine_failed {
            return queue;
        }

        let mut quarantine = self.quarantine.write().await;
        quarantine.retain(|q| queue.iter().any(|item| item.same_fingerprint(q)));

        let before = queue.len();
        queue.retain(|item| !quarantine.iter().any(|q| q.same_fingerprint(item)));
        let skipped = before - queue.len();
        if skipped > 0 {
            debug!("Skipping {} previously failed file(s)", skipped);
        }
        queue
    }

    async fn record(&self, report: &BatchReport) {
        {
            let mut status = self.status.write().await;
            status.files_converted += report.succeeded() as u64;
            status.files_failed += report.failed() as u64;
        }

        if self.config.quarantine_failed {
            let mut quarantine = self.quarantine.write().await;
            for item in report.unconvertible_items() {
                info!("Quarantining {} until it changes", item.name);
                quarantine.push(item.clone());
            }
        }
    }

    async fn set_state(&self, state: LoopState) {
        self.status.write().await.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessorConfig;
    use crate::testing::{MockArchiver, MockConverter, MockScanner};
    use std::time::Duration;

    struct Harness {
        scanner: MockScanner,
        converter: MockConverter,
        archiver: MockArchiver,
        watch: Arc<WatchLoop<MockScanner, MockConverter, MockArchiver>>,
    }

    fn harness(config: OrchestratorConfig) -> Harness {
        let scanner = MockScanner::new();
        let converter = MockConverter::new();
        let archiver = MockArchiver::new();
        let processor = BatchProcessor::new(
            ProcessorConfig::new("/out"),
            converter.clone(),
            archiver.clone(),
        );
        let watch = Arc::new(WatchLoop::new(config, scanner.clone(), processor));
        Harness {
            scanner,
            converter,
            archiver,
            watch,
        }
    }

    #[tokio::test]
    async fn test_empty_scan_is_idle() {
        let h = harness(OrchestratorConfig::default());
        assert_eq!(h.watch.run_cycle().await, CycleOutcome::Idle);

        let status = h.watch.status().await;
        assert_eq!(status.cycles, 1);
        assert!(status.last_cycle_at.is_some());
    }

    #[tokio::test]
    async fn test_batch_is_processed() {
        let h = harness(OrchestratorConfig::default());
        h.scanner
            .push_batch(vec![WorkItem::new("/src/a.mov"), WorkItem::new("/src/b.mov")])
            .await;

        assert_eq!(
            h.watch.run_cycle().await,
            CycleOutcome::Processed {
                converted: 2,
                failed: 0
            }
        );
        assert_eq!(h.archiver.archive_count().await, 2);
        assert_eq!(h.watch.status().await.files_converted, 2);
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let h = harness(OrchestratorConfig::default());
        h.scanner.push_missing_dir("/src").await;

        let outcome = h.watch.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::DiscoveryFailed(_)));
        assert_eq!(
            outcome.delay_after(Duration::from_secs(60)),
            Some(Duration::from_secs(60))
        );
    }

    #[tokio::test]
    async fn test_failed_item_is_quarantined() {
        let h = harness(OrchestratorConfig::default());
        let bad = WorkItem::new("/src/bad.mov").with_metadata(10, None);
        h.scanner.set_sticky(vec![bad.clone()]).await;
        h.converter.set_probe_error("/src/bad.mov", "corrupt").await;

        assert_eq!(
            h.watch.run_cycle().await,
            CycleOutcome::Processed {
                converted: 0,
                failed: 1
            }
        );
        assert_eq!(h.watch.run_cycle().await, CycleOutcome::Idle);
        assert_eq!(h.watch.status().await.quarantined, 1);

        // A changed file is tried again
        h.scanner
            .set_sticky(vec![WorkItem::new("/src/bad.mov").with_metadata(20, None)])
            .await;
        assert!(matches!(
            h.watch.run_cycle().await,
            CycleOutcome::Processed { failed: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_quarantine_pruned_when_file_disappears() {
        let h = harness(OrchestratorConfig::default());
        h.scanner.push_batch(vec![WorkItem::new("/src/bad.mov")]).await;
        h.converter.set_probe_error("/src/bad.mov", "Invalid data found").await;

        h.watch.run_cycle().await;
        assert_eq!(h.watch.status().await.quarantined, 1);

        assert_eq!(h.watch.run_cycle().await, CycleOutcome::Idle);
        assert_eq!(h.watch.status().await.quarantined, 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_not_quarantined() {
        let h = harness(OrchestratorConfig::default());
        h.scanner.set_sticky(vec![WorkItem::new("/src/a.mov")]).await;
        h.converter.set_conversion_error("/src/a.mov", "encoder crashed").await;

        for _ in 0..2 {
            let outcome = h.watch.run_cycle().await;
            assert_eq!(
                outcome,
                CycleOutcome::Processed {
                    converted: 0,
                    failed: 1
                }
            );
            assert_eq!(
                outcome.delay_after(Duration::from_secs(60)),
                Some(Duration::from_secs(60))
            );
        }
        assert_eq!(h.watch.status().await.quarantined, 0);
        assert_eq!(h.converter.conversion_count().await, 2);
    }

    #[tokio::test]
    async fn test_relocation_failure_is_not_quarantined() {
        let h = harness(OrchestratorConfig::default());
        h.scanner.set_sticky(vec![WorkItem::new("/src/a.mov")]).await;
        h.archiver.set_error("/src/a.mov", "permission denied").await;

        h.watch.run_cycle().await;
        h.watch.run_cycle().await;

        let status = h.watch.status().await;
        assert_eq!(status.files_failed, 2);
        assert_eq!(status.quarantined, 0);
    }

    #[tokio::test]
    async fn test_quarantine_disabled_retries() {
        let h = harness(OrchestratorConfig::default().with_quarantine(false));
        h.scanner.set_sticky(vec![WorkItem::new("/src/bad.mov")]).await;
        h.converter.set_probe_error("/src/bad.mov", "corrupt").await;

        for _ in 0..3 {
            assert!(matches!(
                h.watch.run_cycle().await,
                CycleOutcome::Processed { failed: 1, .. }
            ));
        }
        assert_eq!(h.watch.status().await.files_failed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_idle_wait() {
        let h = harness(OrchestratorConfig::default().with_idle_interval(3600));

        let watch = Arc::clone(&h.watch);
        let handle = tokio::spawn(async move { watch.run().await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let status = h.watch.status().await;
        assert!(status.running);
        assert_eq!(status.state, LoopState::Idle);

        let stopped_at = tokio::time::Instant::now();
        h.watch.stop().await;
        handle.await.unwrap();

        assert!(stopped_at.elapsed() < Duration::from_secs(1));
        let status = h.watch.status().await;
        assert!(!status.running);
        assert_eq!(status.state, LoopState::Stopped);
        assert_eq!(h.scanner.scan_count().await, 1);
    }

    #[tokio::test]
    async fn test_stop_when_not_running() {
        let h = harness(OrchestratorConfig::default());
        h.watch.stop().await;
        assert!(!h.watch.status().await.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_run_is_honoured() {
        let h = harness(OrchestratorConfig::default());
        h.watch.stop().await;

        tokio::time::timeout(Duration::from_secs(1), h.watch.run())
            .await
            .expect("run should return after an earlier stop");

        let status = h.watch.status().await;
        assert!(!status.running);
        assert_eq!(status.state, LoopState::Stopped);
        assert_eq!(h.scanner.scan_count().await, 0);
    }
}
