// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler (spec §4.10, component C10): owns the scan and monitor
//! tickers, starting one independent loop per enabled target list and
//! coordinating a bounded shutdown drain.

use recon_core::Clock;
use recon_engine::{MonitorPipeline, ScanPipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

const STOP_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the scan and monitor pipelines on independent tickers. A loop is
/// spawned only if its target list is non-empty (spec §4.10: "a scheduler
/// with no monitor targets runs no monitor loop at all").
pub struct Scheduler<C: Clock> {
    state: parking_lot::Mutex<SchedulerState>,
    cancel: CancellationToken,
    scan_pipeline: Arc<ScanPipeline<C>>,
    monitor_pipeline: Option<Arc<MonitorPipeline<C>>>,
    scan_targets: Vec<String>,
    monitor_targets: Vec<String>,
    scan_interval: Duration,
    monitor_interval: Duration,
    target_source: String,
    scan_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    monitor_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> Scheduler<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scan_pipeline: Arc<ScanPipeline<C>>,
        monitor_pipeline: Option<Arc<MonitorPipeline<C>>>,
        scan_targets: Vec<String>,
        monitor_targets: Vec<String>,
        scan_interval: Duration,
        monitor_interval: Duration,
        target_source: impl Into<String>,
    ) -> Self {
        Self {
            state: parking_lot::Mutex::new(SchedulerState::Stopped),
            cancel: CancellationToken::new(),
            scan_pipeline,
            monitor_pipeline,
            scan_targets,
            monitor_targets,
            scan_interval,
            monitor_interval,
            target_source: target_source.into(),
            scan_task: parking_lot::Mutex::new(None),
            monitor_task: parking_lot::Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Token the resource governor's shutdown callback can cancel to force
    /// a drain from outside the scheduler (spec §7).
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Record a critical-init failure (spec §7: "a component that fails to
    /// initialize moves the scheduler to the Error state without starting
    /// any loop").
    pub fn mark_error(&self) {
        *self.state.lock() = SchedulerState::Error;
    }

    /// Spawn the scan and/or monitor loops. A no-op if already running.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if *state != SchedulerState::Stopped {
                return;
            }
            *state = SchedulerState::Starting;
        }

        if !self.scan_targets.is_empty() {
            let scheduler = self.clone();
            let cancel = self.cancel.child_token();
            let handle = tokio::spawn(async move { scheduler.scan_loop(cancel).await });
            *self.scan_task.lock() = Some(handle);
        }

        if let Some(monitor_pipeline) = self.monitor_pipeline.clone() {
            if !self.monitor_targets.is_empty() {
                let scheduler = self.clone();
                let cancel = self.cancel.child_token();
                let handle = tokio::spawn(async move { scheduler.monitor_loop(monitor_pipeline, cancel).await });
                *self.monitor_task.lock() = Some(handle);
            }
        }

        *self.state.lock() = SchedulerState::Running;
    }

    /// Cancel both loops and wait up to 30s for them to drain (spec §4.10).
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state != SchedulerState::Running {
                return;
            }
            *state = SchedulerState::Stopping;
        }

        self.cancel.cancel();

        let scan_task = self.scan_task.lock().take();
        let monitor_task = self.monitor_task.lock().take();

        let drain = async {
            if let Some(task) = scan_task {
                let _ = task.await;
            }
            if let Some(task) = monitor_task {
                let _ = task.await;
            }
        };

        if tokio::time::timeout(STOP_DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::warn!("scheduler drain exceeded {:?}, stopping anyway", STOP_DRAIN_TIMEOUT);
        }

        *self.state.lock() = SchedulerState::Stopped;
    }

    async fn scan_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.scan_interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.scan_pipeline.run(self.scan_targets.clone(), &self.target_source, "automated", cancel.clone()).await;
                }
            }
        }
    }

    async fn monitor_loop(&self, monitor_pipeline: Arc<MonitorPipeline<C>>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.monitor_interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    monitor_pipeline.run_cycle(self.monitor_targets.clone(), cancel.clone()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_adapters::{
        FakeCrawlerAdapter, FakeFetcherAdapter, FakeProberAdapter, FakeReporterAdapter, FakeWebhookTransport,
    };
    use recon_core::FakeClock;
    use recon_engine::NotificationAggregator;
    use recon_storage::{Codec, HistoryStore, ProbeResultStore, SecretsStore};

    fn scan_pipeline(dir: &std::path::Path) -> Arc<ScanPipeline<FakeClock>> {
        let transport = Arc::new(FakeWebhookTransport::new());
        let notifier = Arc::new(NotificationAggregator::new(transport, None, None, vec![]));
        Arc::new(ScanPipeline::new(
            Arc::new(FakeCrawlerAdapter::new()),
            Arc::new(FakeProberAdapter::new()),
            Arc::new(FakeReporterAdapter::new()),
            Arc::new(ProbeResultStore::new(dir, Codec::Uncompressed)),
            notifier,
            FakeClock::new(),
            500,
            20,
            None,
        ))
    }

    fn monitor_pipeline(dir: &std::path::Path) -> Arc<MonitorPipeline<FakeClock>> {
        let transport = Arc::new(FakeWebhookTransport::new());
        let notifier = Arc::new(NotificationAggregator::new(transport, None, None, vec![]));
        Arc::new(MonitorPipeline::new(
            Arc::new(FakeFetcherAdapter::new()),
            Arc::new(HistoryStore::new(dir, Codec::Uncompressed)),
            Arc::new(SecretsStore::new(dir, Codec::Uncompressed)),
            notifier,
            FakeClock::new(),
            10,
            4,
            1024,
            false,
            false,
        ))
    }

    #[tokio::test]
    async fn no_targets_means_no_loops_spawned_and_stop_is_immediate() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Arc::new(Scheduler::new(
            scan_pipeline(dir.path()),
            None,
            vec![],
            vec![],
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            "file",
        ));
        scheduler.start();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.scan_task.lock().is_none());
        assert!(scheduler.monitor_task.lock().is_none());
        scheduler.stop().await;
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn scan_only_target_list_spawns_only_scan_loop() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Arc::new(Scheduler::new(
            scan_pipeline(dir.path()),
            Some(monitor_pipeline(dir.path())),
            vec!["https://a.test".to_string()],
            vec![],
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            "file",
        ));
        scheduler.start();
        assert!(scheduler.scan_task.lock().is_some());
        assert!(scheduler.monitor_task.lock().is_none());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_cancels_and_drains_within_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Arc::new(Scheduler::new(
            scan_pipeline(dir.path()),
            Some(monitor_pipeline(dir.path())),
            vec!["https://a.test".to_string()],
            vec!["https://a.test/x".to_string()],
            Duration::from_millis(5),
            Duration::from_millis(5),
            "file",
        ));
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.stop().await;
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn mark_error_transitions_state_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Arc::new(Scheduler::new(
            scan_pipeline(dir.path()),
            None,
            vec!["https://a.test".to_string()],
            vec![],
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            "file",
        ));
        scheduler.mark_error();
        assert_eq!(scheduler.state(), SchedulerState::Error);
    }

    #[tokio::test]
    async fn cancel_handle_triggers_external_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Arc::new(Scheduler::new(
            scan_pipeline(dir.path()),
            None,
            vec!["https://a.test".to_string()],
            vec![],
            Duration::from_millis(5),
            Duration::from_secs(3600),
            "file",
        ));
        scheduler.start();
        scheduler.cancel_handle().cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.stop().await;
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }
}
