// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan Pipeline (spec §4.8, component C8): crawl → probe → diff → persist
//! → report → summarize, for a single invocation over one set of seeds.

use crate::notify_aggregator::NotificationAggregator;
use crate::url_differ::{count_statuses, diff_urls};
use recon_adapters::{CrawlerAdapter, ProberAdapter, ReporterAdapter};
use recon_core::{Clock, CycleId, ProbeResult, ScanStatus, ScanSummary};
use recon_storage::ProbeResultStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fans out the crawl/probe/diff/persist/report stages for one scan
/// invocation. Collaborators are injected as `Arc<dyn Trait>` objects
/// rather than generic parameters, since each scan run constructs exactly
/// one pipeline and the extra dynamic dispatch is immaterial next to the
/// network/disk I/O each stage performs.
pub struct ScanPipeline<C: Clock> {
    crawler: Arc<dyn CrawlerAdapter>,
    prober: Arc<dyn ProberAdapter>,
    reporter: Arc<dyn ReporterAdapter>,
    store: Arc<ProbeResultStore>,
    notifier: Arc<NotificationAggregator>,
    clock: C,
    max_discovered_urls: usize,
    probe_concurrency: usize,
    root_target_override: Option<String>,
}

impl<C: Clock> ScanPipeline<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        crawler: Arc<dyn CrawlerAdapter>,
        prober: Arc<dyn ProberAdapter>,
        reporter: Arc<dyn ReporterAdapter>,
        store: Arc<ProbeResultStore>,
        notifier: Arc<NotificationAggregator>,
        clock: C,
        max_discovered_urls: usize,
        probe_concurrency: usize,
        root_target_override: Option<String>,
    ) -> Self {
        Self { crawler, prober, reporter, store, notifier, clock, max_discovered_urls, probe_concurrency, root_target_override }
    }

    /// Run one scan invocation against `seeds` (spec §4.8 steps 1-8).
    pub async fn run(&self, seeds: Vec<String>, target_source: &str, mode: &str, cancel: CancellationToken) -> ScanSummary {
        let started_ms = self.clock.epoch_ms();
        let session_id = CycleId::from_epoch_ms(started_ms);
        let mut summary = ScanSummary::started(session_id.clone(), target_source, mode);

        if seeds.is_empty() {
            summary.status = ScanStatus::NoTargets;
            return summary;
        }
        summary.targets = seeds.clone();
        let root_target = self.root_target_override.clone().unwrap_or_else(|| seeds[0].clone());

        self.notifier.send_scan_start(session_id.as_str(), mode, &seeds, started_ms).await;

        if cancel.is_cancelled() {
            return self.interrupted(summary).await;
        }

        let discovered = match self.crawler.crawl(&seeds, self.max_discovered_urls).await {
            Ok(d) => d,
            Err(e) => return self.failed(summary, "crawler", e.to_string()).await,
        };

        if cancel.is_cancelled() {
            return self.interrupted(summary).await;
        }

        let probed = match self.prober.probe(&discovered, self.probe_concurrency).await {
            Ok(p) => p,
            Err(e) => return self.failed(summary, "prober", e.to_string()).await,
        };

        let results = reconcile_placeholders(discovered, probed, &root_target, session_id.as_str(), self.clock.epoch_ms());
        summary.probed = results.len();
        summary.successful = results.iter().filter(|r| r.is_success()).count();
        summary.failed = summary.probed - summary.successful;

        if cancel.is_cancelled() {
            return self.interrupted(summary).await;
        }

        let prior = self.store.latest_by_url(&root_target).unwrap_or_default();
        let classified = diff_urls(results, &prior, self.clock.epoch_ms());
        let counts = count_statuses(&classified);
        summary.diff_new = counts.new;
        summary.diff_existing = counts.existing;
        summary.diff_old = counts.old;

        if let Err(e) = self.store.write(&classified, session_id.as_str(), &root_target, &cancel).await {
            summary.status = ScanStatus::PartialComplete;
            summary.errors.push(e.to_string());
            self.notifier.send_scan_complete(&summary, &[], self.clock.epoch_ms()).await;
            return summary;
        }

        if cancel.is_cancelled() {
            return self.interrupted(summary).await;
        }

        let report_paths = match self.reporter.generate(session_id.as_str(), &root_target, &classified).await {
            Ok(paths) => paths,
            Err(e) => return self.failed(summary, "reporter", e.to_string()).await,
        };

        summary.report_paths = report_paths.clone();
        summary.duration = Duration::from_millis(self.clock.epoch_ms().saturating_sub(started_ms));
        summary.status = ScanStatus::Completed;
        self.notifier.send_scan_complete(&summary, &report_paths, self.clock.epoch_ms()).await;
        summary
    }

    async fn failed(&self, mut summary: ScanSummary, component: &str, message: String) -> ScanSummary {
        summary.status = ScanStatus::Failed;
        summary.failed_component = Some(component.to_string());
        summary.errors.push(message.clone());
        self.notifier.send_critical_error(component, &message, self.clock.epoch_ms()).await;
        self.notifier.send_scan_complete(&summary, &[], self.clock.epoch_ms()).await;
        summary
    }

    async fn interrupted(&self, mut summary: ScanSummary) -> ScanSummary {
        summary.status = ScanStatus::Interrupted;
        summary.errors.push("cancelled before completion".to_string());
        self.notifier.send_scan_complete(&summary, &[], self.clock.epoch_ms()).await;
        summary
    }
}

/// Reorder probe results to `discovered`'s order, synthesizing a
/// placeholder for any discovered URL the prober didn't return a record for
/// (spec §4.8 step 4).
fn reconcile_placeholders(
    discovered: Vec<String>,
    probed: Vec<ProbeResult>,
    root_target: &str,
    session_id: &str,
    now_ms: u64,
) -> Vec<ProbeResult> {
    let mut by_url: HashMap<String, ProbeResult> = probed.into_iter().map(|r| (r.input_url.clone(), r)).collect();
    discovered
        .into_iter()
        .map(|url| {
            by_url.remove(&url).unwrap_or_else(|| {
                ProbeResult::placeholder(url, root_target, session_id, "prober returned no record for this URL", now_ms)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_adapters::{FakeCrawlerAdapter, FakeProberAdapter, FakeReporterAdapter, FakeWebhookTransport};
    use recon_core::{test_support::probe_result, FakeClock, UrlStatus};
    use recon_storage::Codec;
    use tempfile::tempdir;

    fn pipeline(
        crawler: FakeCrawlerAdapter,
        prober: FakeProberAdapter,
        reporter: FakeReporterAdapter,
        store: ProbeResultStore,
    ) -> (ScanPipeline<FakeClock>, Arc<FakeWebhookTransport>) {
        let transport = Arc::new(FakeWebhookTransport::new());
        let notifier = Arc::new(NotificationAggregator::new(transport.clone(), Some("https://hook.test".to_string()), None, vec![]));
        let pipeline = ScanPipeline::new(
            Arc::new(crawler),
            Arc::new(prober),
            Arc::new(reporter),
            Arc::new(store),
            notifier,
            FakeClock::new(),
            500,
            20,
            None,
        );
        (pipeline, transport)
    }

    #[tokio::test]
    async fn empty_seeds_yields_no_targets_without_running_stages() {
        let crawler = FakeCrawlerAdapter::new();
        let dir = tempdir().unwrap();
        let (pipeline, transport) = pipeline(crawler.clone(), FakeProberAdapter::new(), FakeReporterAdapter::new(), ProbeResultStore::new(dir.path(), Codec::Uncompressed));
        let summary = pipeline.run(vec![], "file", "onetime", CancellationToken::new()).await;
        assert_eq!(summary.status, ScanStatus::NoTargets);
        assert!(crawler.calls().is_empty());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn discovered_url_without_probe_result_gets_placeholder() {
        let crawler = FakeCrawlerAdapter::with_discovered(vec!["https://a.test/x".to_string(), "https://a.test/y".to_string()]);
        let prober = FakeProberAdapter::new();
        prober.set_result("https://a.test/x", probe_result("https://a.test/x", "https://a.test", UrlStatus::New));
        let dir = tempdir().unwrap();
        let (pipeline, _transport) = pipeline(crawler, prober, FakeReporterAdapter::new(), ProbeResultStore::new(dir.path(), Codec::Uncompressed));

        let summary = pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", CancellationToken::new()).await;
        assert_eq!(summary.status, ScanStatus::Completed);
        assert_eq!(summary.probed, 2);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn crawler_failure_yields_failed_status_with_component() {
        let crawler = FakeCrawlerAdapter::new();
        crawler.fail_with("dns resolution failed");
        let dir = tempdir().unwrap();
        let (pipeline, transport) = pipeline(crawler, FakeProberAdapter::new(), FakeReporterAdapter::new(), ProbeResultStore::new(dir.path(), Codec::Uncompressed));

        let summary = pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", CancellationToken::new()).await;
        assert_eq!(summary.status, ScanStatus::Failed);
        assert_eq!(summary.failed_component.as_deref(), Some("crawler"));
        assert_eq!(transport.sent().len(), 3); // start, critical-error, complete
    }

    #[tokio::test]
    async fn cancellation_before_crawl_yields_interrupted() {
        let crawler = FakeCrawlerAdapter::with_discovered(vec!["https://a.test/x".to_string()]);
        let dir = tempdir().unwrap();
        let (pipeline, _transport) = pipeline(crawler.clone(), FakeProberAdapter::new(), FakeReporterAdapter::new(), ProbeResultStore::new(dir.path(), Codec::Uncompressed));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", cancel).await;
        assert_eq!(summary.status, ScanStatus::Interrupted);
        assert!(crawler.calls().is_empty());
    }

    #[tokio::test]
    async fn root_target_override_is_used_instead_of_first_seed() {
        let crawler = FakeCrawlerAdapter::with_discovered(vec!["https://a.test/x".to_string()]);
        let prober = FakeProberAdapter::new();
        prober.set_result("https://a.test/x", probe_result("https://a.test/x", "https://a.test", UrlStatus::New));
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        let transport = Arc::new(FakeWebhookTransport::new());
        let notifier = Arc::new(NotificationAggregator::new(transport, Some("https://hook.test".to_string()), None, vec![]));
        let pipeline = ScanPipeline::new(
            Arc::new(crawler),
            Arc::new(prober),
            Arc::new(FakeReporterAdapter::new()),
            Arc::new(store),
            notifier,
            FakeClock::new(),
            500,
            20,
            Some("https://canonical.test".to_string()),
        );

        pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", CancellationToken::new()).await;

        let by_url = pipeline.store.latest_by_url("https://canonical.test").unwrap();
        assert!(by_url.contains_key("https://a.test/x"), "results must be keyed on the override, not the first seed");
        assert!(pipeline.store.latest_by_url("https://a.test").unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_scan_preserves_first_seen_for_existing_urls() {
        let crawler = FakeCrawlerAdapter::with_discovered(vec!["https://a.test/x".to_string()]);
        let prober = FakeProberAdapter::new();
        prober.set_result("https://a.test/x", probe_result("https://a.test/x", "https://a.test", UrlStatus::New));
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        let (pipeline, _transport) = pipeline(crawler, prober, FakeReporterAdapter::new(), store);

        let first = pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", CancellationToken::new()).await;
        assert_eq!(first.diff_new, 1);

        let second = pipeline.run(vec!["https://a.test".to_string()], "file", "onetime", CancellationToken::new()).await;
        assert_eq!(second.diff_existing, 1);
        assert_eq!(second.diff_new, 0);
    }
}
