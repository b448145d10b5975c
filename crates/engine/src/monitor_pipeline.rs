// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor Pipeline (spec §4.9, component C9): per-URL conditional-fetch,
//! hash-compare, content-diff, and secret-scan, run in sequential batches
//! with a bounded concurrent worker pool within each batch.

use crate::content_differ::diff_content;
use crate::notify_aggregator::{FileChangeEvent, MonitorErrorEvent, NotificationAggregator};
use crate::secret_detector;
use crate::task_tracker::TaskCounter;
use recon_adapters::{FetcherAdapter, RetryPolicy};
use recon_core::{Clock, FileHistoryRecord, Target};
use recon_storage::{HistoryStore, SecretsStore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Per-URL fetch/compare state carried across monitor cycles (spec §4.9).
#[derive(Debug, Clone, Default)]
struct UrlMonitorState {
    last_hash: Option<String>,
    last_etag: Option<String>,
    last_last_modified: Option<String>,
    last_error_ts: Option<u64>,
    backoff_attempt: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorCycleCounts {
    pub total: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub errored: usize,
}

pub struct MonitorPipeline<C: Clock> {
    fetcher: Arc<dyn FetcherAdapter>,
    history: Arc<HistoryStore>,
    secrets: Arc<SecretsStore>,
    notifier: Arc<NotificationAggregator>,
    clock: C,
    batch_size: usize,
    worker_concurrency: usize,
    max_content_size: usize,
    secrets_enabled: bool,
    secrets_notify_on_found: bool,
    backoff: RetryPolicy,
    state: parking_lot::Mutex<HashMap<String, UrlMonitorState>>,
    task_counter: TaskCounter,
}

impl<C: Clock> MonitorPipeline<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn FetcherAdapter>,
        history: Arc<HistoryStore>,
        secrets: Arc<SecretsStore>,
        notifier: Arc<NotificationAggregator>,
        clock: C,
        batch_size: usize,
        worker_concurrency: usize,
        max_content_size: usize,
        secrets_enabled: bool,
        secrets_notify_on_found: bool,
    ) -> Self {
        Self {
            fetcher,
            history,
            secrets,
            notifier,
            clock,
            batch_size: batch_size.max(1),
            worker_concurrency: worker_concurrency.max(1),
            max_content_size,
            secrets_enabled,
            secrets_notify_on_found,
            backoff: RetryPolicy::default(),
            state: parking_lot::Mutex::new(HashMap::new()),
            task_counter: TaskCounter::new(),
        }
    }

    /// The live count of in-flight per-URL worker tasks, fed to the
    /// Resource Governor's "goroutine count" sample (spec §4.1).
    pub fn task_counter(&self) -> TaskCounter {
        self.task_counter.clone()
    }

    /// Run one monitor cycle over `urls`, batched sequentially (spec §4.9).
    /// Returns once every batch has drained, having emitted the cycle's
    /// aggregated notifications via the injected aggregator.
    pub async fn run_cycle(self: &Arc<Self>, urls: Vec<String>, cancel: CancellationToken) -> MonitorCycleCounts {
        self.notifier.on_monitor_start();
        let mut counts = MonitorCycleCounts::default();

        for batch in urls.chunks(self.batch_size) {
            if cancel.is_cancelled() {
                break;
            }
            let semaphore = Arc::new(Semaphore::new(self.worker_concurrency));
            let mut tasks = tokio::task::JoinSet::new();

            for url in batch {
                let pipeline = self.clone();
                let url = url.clone();
                let semaphore = semaphore.clone();
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    let _task_guard = pipeline.task_counter.guard();
                    let _permit = semaphore.acquire_owned().await.ok();
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(pipeline.process_one(url).await)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let Ok(Some(outcome)) = joined else { continue };
                counts.total += 1;
                match outcome {
                    UrlOutcome::Unchanged => counts.unchanged += 1,
                    UrlOutcome::Changed { url, content_type } => {
                        counts.changed += 1;
                        self.notifier.record_file_change(FileChangeEvent { url, content_type });
                    }
                    UrlOutcome::Errored { url, message } => {
                        counts.errored += 1;
                        self.notifier.record_monitor_error(MonitorErrorEvent { url, message });
                    }
                }
            }
        }

        self.notifier.send_cycle_complete(counts.total, self.clock.epoch_ms()).await;
        counts
    }

    async fn process_one(&self, url: String) -> UrlOutcome {
        let now_ms = self.clock.epoch_ms();

        let host_port = match Target::parse(&url) {
            Ok(t) => t.host_port().unwrap_or_else(|| url.clone()),
            Err(e) => return UrlOutcome::Errored { url, message: e.to_string() },
        };

        let (last_etag, last_last_modified, last_hash, backoff_attempt, last_error_ts) = {
            let state = self.state.lock();
            let s = state.get(&url).cloned().unwrap_or_default();
            (s.last_etag, s.last_last_modified, s.last_hash, s.backoff_attempt, s.last_error_ts)
        };

        if let Some(error_ts) = last_error_ts {
            let delay = self.backoff.delay_for(backoff_attempt);
            if now_ms < error_ts.saturating_add(delay.as_millis() as u64) {
                return UrlOutcome::Errored { url, message: "skipped: backing off after prior fetch error".to_string() };
            }
        }

        let outcome = self.fetcher.fetch(&url, last_etag.as_deref(), last_last_modified.as_deref()).await;

        match outcome {
            Ok(fetch) if fetch.not_modified => {
                self.record_success(&url, fetch.etag, fetch.last_modified_hdr, last_hash);
                UrlOutcome::Unchanged
            }
            Ok(fetch) => {
                let mut body = fetch.body;
                if body.len() > self.max_content_size {
                    body.truncate(self.max_content_size);
                }
                let new_hash = hex::encode(Sha256::digest(&body));

                if Some(&new_hash) == last_hash.as_ref() {
                    self.record_success(&url, fetch.etag, fetch.last_modified_hdr, Some(new_hash));
                    return UrlOutcome::Unchanged;
                }

                let previous = self.history.latest(&url, &host_port).await.ok().flatten();
                let previous_bytes = previous.as_ref().map(|r| r.content_bytes.as_slice()).unwrap_or(&[]);
                let content_diff = diff_content(previous_bytes, &body, fetch.content_type.as_deref());

                if self.secrets_enabled {
                    let findings = secret_detector::scan(&url, &body, now_ms);
                    if !findings.is_empty() {
                        let _ = self.secrets.append(&findings).await;
                        if self.secrets_notify_on_found {
                            for finding in &findings {
                                self.notifier.send_secret_found(&finding.source_url, &finding.rule_id, &finding.description, now_ms).await;
                            }
                        }
                    }
                }

                let record = FileHistoryRecord {
                    url: url.clone(),
                    timestamp_ms: now_ms,
                    content_hash: new_hash.clone(),
                    content_bytes: body,
                    content_type: fetch.content_type.clone(),
                    etag: fetch.etag.clone(),
                    last_modified_hdr: fetch.last_modified_hdr.clone(),
                    diff_json: serde_json::to_string(&content_diff).ok(),
                    extracted_paths_json: serde_json::to_string(&content_diff.extracted_paths).ok(),
                };
                let _ = self.history.store(&host_port, record).await;

                self.record_success(&url, fetch.etag, fetch.last_modified_hdr, Some(new_hash));
                UrlOutcome::Changed { url, content_type: fetch.content_type }
            }
            Err(e) => {
                let mut state = self.state.lock();
                let entry = state.entry(url.clone()).or_default();
                entry.last_error_ts = Some(now_ms);
                entry.backoff_attempt = entry.backoff_attempt.saturating_add(1);
                UrlOutcome::Errored { url, message: e.to_string() }
            }
        }
    }

    fn record_success(&self, url: &str, etag: Option<String>, last_modified: Option<String>, hash: Option<String>) {
        let mut state = self.state.lock();
        let entry = state.entry(url.to_string()).or_default();
        entry.last_etag = etag;
        entry.last_last_modified = last_modified;
        entry.last_hash = hash;
        entry.last_error_ts = None;
        entry.backoff_attempt = 0;
    }
}

enum UrlOutcome {
    Unchanged,
    Changed { url: String, content_type: Option<String> },
    Errored { url: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_adapters::{FakeFetcherAdapter, FakeWebhookTransport, FetchOutcome};
    use recon_core::FakeClock;
    use recon_storage::Codec;
    use tempfile::tempdir;

    fn build_pipeline(fetcher: FakeFetcherAdapter) -> (Arc<MonitorPipeline<FakeClock>>, Arc<FakeWebhookTransport>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let history = Arc::new(HistoryStore::new(dir.path(), Codec::Uncompressed));
        let secrets = Arc::new(SecretsStore::new(dir.path(), Codec::Uncompressed));
        let transport = Arc::new(FakeWebhookTransport::new());
        let notifier = Arc::new(NotificationAggregator::new(transport.clone(), None, Some("https://hook.test".to_string()), vec![]));
        let pipeline = Arc::new(MonitorPipeline::new(
            Arc::new(fetcher),
            history,
            secrets,
            notifier,
            FakeClock::new(),
            10,
            4,
            10 * 1024 * 1024,
            true,
            true,
        ));
        (pipeline, transport, dir)
    }

    #[tokio::test]
    async fn first_fetch_of_a_url_is_reported_as_changed() {
        let fetcher = FakeFetcherAdapter::new();
        fetcher.set_outcome(
            "https://a.test/app.js",
            FetchOutcome { status_code: Some(200), not_modified: false, body: b"console.log(1)".to_vec(), content_type: Some("application/javascript".to_string()), etag: None, last_modified_hdr: None },
        );
        let (pipeline, _transport, _dir) = build_pipeline(fetcher);

        let counts = pipeline.run_cycle(vec!["https://a.test/app.js".to_string()], CancellationToken::new()).await;
        assert_eq!(counts.changed, 1);
        assert_eq!(counts.unchanged, 0);
    }

    #[tokio::test]
    async fn unchanged_body_is_not_reported_as_changed() {
        let fetcher = FakeFetcherAdapter::new();
        fetcher.set_outcome(
            "https://a.test/app.js",
            FetchOutcome { status_code: Some(200), not_modified: false, body: b"same".to_vec(), content_type: Some("text/plain".to_string()), etag: None, last_modified_hdr: None },
        );
        let (pipeline, _transport, _dir) = build_pipeline(fetcher);

        pipeline.run_cycle(vec!["https://a.test/app.js".to_string()], CancellationToken::new()).await;
        let second = pipeline.run_cycle(vec!["https://a.test/app.js".to_string()], CancellationToken::new()).await;
        assert_eq!(second.changed, 0);
        assert_eq!(second.unchanged, 1);
    }

    #[tokio::test]
    async fn not_modified_response_counts_as_unchanged() {
        let fetcher = FakeFetcherAdapter::new();
        fetcher.set_outcome(
            "https://a.test/x",
            FetchOutcome { status_code: Some(304), not_modified: true, body: Vec::new(), content_type: None, etag: Some("\"v1\"".to_string()), last_modified_hdr: None },
        );
        let (pipeline, _transport, _dir) = build_pipeline(fetcher);

        let counts = pipeline.run_cycle(vec!["https://a.test/x".to_string()], CancellationToken::new()).await;
        assert_eq!(counts.unchanged, 1);
    }

    #[tokio::test]
    async fn fetch_error_is_counted_and_notified() {
        let fetcher = FakeFetcherAdapter::new();
        // no outcome configured for this URL -> fetch() returns an error
        let (pipeline, transport, _dir) = build_pipeline(fetcher);

        let counts = pipeline.run_cycle(vec!["https://a.test/missing".to_string()], CancellationToken::new()).await;
        assert_eq!(counts.errored, 1);
        assert!(transport.sent().iter().any(|(_, p)| p.embed.as_ref().is_some_and(|e| e.title.contains("errors"))));
    }

    #[tokio::test]
    async fn cycle_emits_exactly_one_complete_notification_set() {
        let fetcher = FakeFetcherAdapter::new();
        fetcher.set_outcome(
            "https://a.test/app.js",
            FetchOutcome { status_code: Some(200), not_modified: false, body: b"hello".to_vec(), content_type: Some("text/plain".to_string()), etag: None, last_modified_hdr: None },
        );
        let (pipeline, transport, _dir) = build_pipeline(fetcher);
        pipeline.run_cycle(vec!["https://a.test/app.js".to_string()], CancellationToken::new()).await;
        // file-changes + cycle-complete
        assert_eq!(transport.sent().len(), 2);
    }
}
