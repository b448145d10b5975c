// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification Aggregator (spec §4.7, component C7): coalesces per-cycle
//! events into batched webhook payloads, never emitting per-event.

use crate::embed_builder::{sample_with_overflow_note, EmbedBuilder};
use recon_adapters::{chunk_attachment, FileAttachment, WebhookPayload, WebhookTransport};
use recon_core::{ScanStatus, ScanSummary};
use std::collections::HashMap;
use std::sync::Arc;

const SAMPLE_LIMIT: usize = 5;

/// One detected file change, folded into the cycle-end `FileChanges`
/// notification.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    pub url: String,
    pub content_type: Option<String>,
}

/// One per-URL fetch failure, folded into the cycle-end `MonitorErrors`
/// notification.
#[derive(Debug, Clone)]
pub struct MonitorErrorEvent {
    pub url: String,
    pub message: String,
}

/// Private cycle-scoped buffer for the monitor pipeline, reset at
/// `on_monitor_start` (spec §9 "the buffer is the aggregator's private
/// state and is reset at cycle start").
#[derive(Debug, Default)]
struct MonitorCycleBuffer {
    changes: Vec<FileChangeEvent>,
    errors: Vec<MonitorErrorEvent>,
}

fn rfc3339_now(now_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(now_ms as i64).unwrap_or_default().to_rfc3339()
}

fn mention_prefix(mention_role_ids: &[String]) -> Option<String> {
    if mention_role_ids.is_empty() {
        return None;
    }
    Some(mention_role_ids.iter().map(|id| format!("<@&{id}>")).collect::<Vec<_>>().join(" "))
}

/// Coalesces scan/monitor events into webhook deliveries. Best-effort: a
/// permanent send failure is logged but never propagated to the caller
/// (spec §4.7 "MUST NOT fail the containing scan or monitor cycle").
pub struct NotificationAggregator {
    transport: Arc<dyn WebhookTransport>,
    scan_webhook_url: Option<String>,
    monitor_webhook_url: Option<String>,
    mention_role_ids: Vec<String>,
    monitor_buffer: parking_lot::Mutex<MonitorCycleBuffer>,
}

impl NotificationAggregator {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        scan_webhook_url: Option<String>,
        monitor_webhook_url: Option<String>,
        mention_role_ids: Vec<String>,
    ) -> Self {
        Self {
            transport,
            scan_webhook_url,
            monitor_webhook_url,
            mention_role_ids,
            monitor_buffer: parking_lot::Mutex::new(MonitorCycleBuffer::default()),
        }
    }

    async fn deliver(&self, webhook_url: Option<&str>, payload: WebhookPayload) {
        let Some(url) = webhook_url else {
            return;
        };
        if let Err(e) = self.transport.send(url, &payload).await {
            tracing::warn!(error = %e, "notification delivery failed, continuing cycle");
        }
    }

    pub async fn send_scan_start(&self, session_id: &str, mode: &str, targets: &[String], now_ms: u64) {
        let sample = sample_with_overflow_note(targets, SAMPLE_LIMIT);
        let embed = EmbedBuilder::new("Scan started", 0x3498db, rfc3339_now(now_ms))
            .description(format!("session {session_id} ({mode})"))
            .add_field("targets", sample, false)
            .build();
        let Ok(embed) = embed else {
            tracing::warn!("scan start embed exceeded size caps, dropping notification");
            return;
        };
        let content = mention_prefix(&self.mention_role_ids);
        self.deliver(self.scan_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
    }

    pub async fn send_scan_complete(&self, summary: &ScanSummary, report_paths: &[String], now_ms: u64) {
        let color = match summary.status {
            ScanStatus::Completed => 0x2ecc71,
            ScanStatus::PartialComplete => 0xf39c12,
            ScanStatus::Interrupted => 0x95a5a6,
            ScanStatus::Failed => 0xe74c3c,
            ScanStatus::NoTargets => 0x95a5a6,
            ScanStatus::Started => 0x3498db,
        };
        let embed = EmbedBuilder::new(format!("Scan {:?}", summary.status), color, rfc3339_now(now_ms))
            .description(format!("session {}", summary.session_id))
            .add_field("probed", summary.probed.to_string(), true)
            .add_field("successful", summary.successful.to_string(), true)
            .add_field("failed", summary.failed.to_string(), true)
            .add_field("new", summary.diff_new.to_string(), true)
            .add_field("existing", summary.diff_existing.to_string(), true)
            .add_field("old", summary.diff_old.to_string(), true)
            .build();
        let Ok(embed) = embed else {
            tracing::warn!("scan complete embed exceeded size caps, dropping notification");
            return;
        };
        let content = mention_prefix(&self.mention_role_ids);

        if let Some(path) = report_paths.first() {
            if let Ok(bytes) = std::fs::read(path) {
                let filename = std::path::Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or("report.html").to_string();
                let attachment = FileAttachment { filename, bytes };
                for payload in chunk_attachment(content.clone(), Some(embed.clone()), attachment) {
                    self.deliver(self.scan_webhook_url.as_deref(), payload).await;
                }
                return;
            }
        }
        self.deliver(self.scan_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
    }

    /// Notify on a secret finding (spec §4.6: "if configured, notifies"),
    /// gated by the caller on `secrets_config.notify_on_found`. Sent
    /// immediately rather than buffered into the cycle-end aggregate: a
    /// live credential leak warrants prompt delivery, not batching until
    /// cycle end.
    pub async fn send_secret_found(&self, url: &str, rule_id: &str, description: &str, now_ms: u64) {
        let embed = EmbedBuilder::new("Secret detected", 0xe74c3c, rfc3339_now(now_ms))
            .description(description)
            .add_field("url", url, false)
            .add_field("rule", rule_id, true)
            .build();
        let Ok(embed) = embed else {
            tracing::warn!("secret found embed exceeded size caps, dropping notification");
            return;
        };
        let content = mention_prefix(&self.mention_role_ids);
        self.deliver(self.monitor_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
    }

    pub async fn send_critical_error(&self, component: &str, message: &str, now_ms: u64) {
        let embed = EmbedBuilder::new("Critical error", 0xe74c3c, rfc3339_now(now_ms))
            .description(message)
            .add_field("component", component, true)
            .build();
        let Ok(embed) = embed else {
            tracing::warn!("critical error embed exceeded size caps, dropping notification");
            return;
        };
        let content = mention_prefix(&self.mention_role_ids);
        self.deliver(self.scan_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
    }

    /// Reset the monitor cycle buffer (spec §9).
    pub fn on_monitor_start(&self) {
        *self.monitor_buffer.lock() = MonitorCycleBuffer::default();
    }

    pub fn record_file_change(&self, event: FileChangeEvent) {
        self.monitor_buffer.lock().changes.push(event);
    }

    pub fn record_monitor_error(&self, event: MonitorErrorEvent) {
        self.monitor_buffer.lock().errors.push(event);
    }

    /// Emit exactly one `FileChanges` notification every cycle, empty or
    /// not, and exactly one `MonitorErrors` notification iff at least one
    /// fetch errored (spec.md invariants: "a monitor cycle emits exactly one
    /// `FileChanges` notification containing every detected change in that
    /// cycle"; scenario 4 describes the no-change case as an empty
    /// `FileChanges`, not a withheld one).
    pub async fn send_cycle_complete(&self, total_monitored: usize, now_ms: u64) {
        let (changes, errors) = {
            let buffer = self.monitor_buffer.lock();
            (buffer.changes.clone(), buffer.errors.clone())
        };

        {
            let mut by_content_type: HashMap<String, usize> = HashMap::new();
            for c in &changes {
                *by_content_type.entry(c.content_type.clone().unwrap_or_else(|| "unknown".to_string())).or_insert(0) += 1;
            }
            let urls: Vec<String> = changes.iter().map(|c| c.url.clone()).collect();
            let mut builder = EmbedBuilder::new("File changes detected", 0xf39c12, rfc3339_now(now_ms))
                .description(format!("{} file(s) changed", changes.len()))
                .add_field("urls", sample_with_overflow_note(&urls, SAMPLE_LIMIT), false);
            for (content_type, count) in &by_content_type {
                builder = builder.add_field(content_type, count.to_string(), true);
            }
            if let Ok(embed) = builder.build() {
                let content = mention_prefix(&self.mention_role_ids);
                self.deliver(self.monitor_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
            } else {
                tracing::warn!("file changes embed exceeded size caps, dropping notification");
            }
        }

        if !errors.is_empty() {
            let urls: Vec<String> = errors.iter().map(|e| e.url.clone()).collect();
            let embed = EmbedBuilder::new("Monitor fetch errors", 0xe74c3c, rfc3339_now(now_ms))
                .description(format!("{} fetch(es) failed", errors.len()))
                .add_field("urls", sample_with_overflow_note(&urls, SAMPLE_LIMIT), false)
                .build();
            if let Ok(embed) = embed {
                let content = mention_prefix(&self.mention_role_ids);
                self.deliver(self.monitor_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
            } else {
                tracing::warn!("monitor errors embed exceeded size caps, dropping notification");
            }
        }

        let embed = EmbedBuilder::new("Monitor cycle complete", 0x3498db, rfc3339_now(now_ms))
            .add_field("total_monitored", total_monitored.to_string(), true)
            .add_field("changed", changes.len().to_string(), true)
            .add_field("errored", errors.len().to_string(), true)
            .build();
        if let Ok(embed) = embed {
            let content = mention_prefix(&self.mention_role_ids);
            self.deliver(self.monitor_webhook_url.as_deref(), WebhookPayload { content, embed: Some(embed), attachment: None }).await;
        }
    }
}
