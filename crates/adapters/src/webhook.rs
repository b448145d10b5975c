// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook transport (spec §1 "the Discord webhook transport", §4.7 delivery
//! rules): retry on {429, 5xx} with exponential backoff and optional jitter.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook send failed after {attempts} attempt(s): {message}")]
    SendFailed { attempts: u32, message: String },
    #[error("send cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedPayload {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: String,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A single outbound webhook message: an embed plus optional file part.
#[derive(Debug, Clone)]
pub struct WebhookPayload {
    pub content: Option<String>,
    pub embed: Option<EmbedPayload>,
    pub attachment: Option<FileAttachment>,
}

/// Discord's default (non-boosted) per-message attachment limit. Files
/// larger than this are split into multiple `part k/n` payloads by
/// [`chunk_attachment`] (spec §4.7).
pub const ATTACHMENT_CHUNK_LIMIT: usize = 8 * 1024 * 1024;

/// Split `attachment` into one or more `WebhookPayload`s not exceeding
/// `ATTACHMENT_CHUNK_LIMIT` each, when it's oversized. The first payload
/// carries `embed`/`content` verbatim; `attachment` within the limit yields
/// exactly that one payload unchanged. Subsequent payloads (when the file
/// is split) carry no embed, only a `part k/n` content line and that
/// chunk's bytes under a `<name>.partK` filename (spec §4.7: "the first
/// payload carries the embed; subsequent payloads carry part k/n
/// references and the remaining file chunks").
pub fn chunk_attachment(content: Option<String>, embed: Option<EmbedPayload>, attachment: FileAttachment) -> Vec<WebhookPayload> {
    if attachment.bytes.len() <= ATTACHMENT_CHUNK_LIMIT {
        return vec![WebhookPayload { content, embed, attachment: Some(attachment) }];
    }

    let chunks: Vec<&[u8]> = attachment.bytes.chunks(ATTACHMENT_CHUNK_LIMIT).collect();
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let part = FileAttachment { filename: format!("{}.part{}", attachment.filename, i + 1), bytes: chunk.to_vec() };
            if i == 0 {
                WebhookPayload { content: content.clone(), embed: embed.clone(), attachment: Some(part) }
            } else {
                WebhookPayload { content: Some(format!("part {}/{}", i + 1, total)), embed: None, attachment: Some(part) }
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(500), max_delay: Duration::from_secs(30), jitter: true }
    }
}

impl RetryPolicy {
    /// `base · 2^attempt`, capped at `max_delay` (spec §4.7).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        scaled.min(self.max_delay)
    }

    /// Jitter up to 10% of the computed delay, deterministic on `salt` so
    /// tests don't depend on real randomness (spec allows "optional jitter").
    pub fn jittered_delay_for(&self, attempt: u32, salt: u64) -> Duration {
        let base = self.delay_for(attempt);
        if !self.jitter {
            return base;
        }
        let max_jitter_ms = (base.as_millis() as u64) / 10;
        if max_jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(salt % max_jitter_ms)
    }
}

#[async_trait]
pub trait WebhookTransport: Send + Sync + 'static {
    async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), WebhookError>;
}

/// Production transport posting to a Discord-compatible webhook endpoint.
pub struct DiscordWebhookTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl DiscordWebhookTransport {
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    fn is_retryable(status: reqwest::StatusCode) -> bool {
        status.as_u16() == 429 || status.is_server_error()
    }
}

#[derive(Serialize)]
struct DiscordWireEmbed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
    timestamp: &'a str,
    fields: &'a [EmbedField],
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordWireFooter<'a>>,
}

#[derive(Serialize)]
struct DiscordWireFooter<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct DiscordWireBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<DiscordWireEmbed<'a>>,
}

#[async_trait]
impl WebhookTransport for DiscordWebhookTransport {
    async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let embeds: Vec<DiscordWireEmbed<'_>> = payload
            .embed
            .iter()
            .map(|e| DiscordWireEmbed {
                title: &e.title,
                description: &e.description,
                color: e.color,
                timestamp: &e.timestamp,
                fields: &e.fields,
                footer: e.footer.as_deref().map(|text| DiscordWireFooter { text }),
            })
            .collect();
        let body = DiscordWireBody { content: payload.content.as_deref(), embeds };

        let mut last_error = String::new();
        for attempt in 0..=self.policy.max_retries {
            let request = if let Some(attachment) = &payload.attachment {
                let json = serde_json::to_string(&body).unwrap_or_default();
                let form = reqwest::multipart::Form::new()
                    .text("payload_json", json)
                    .part("files[0]", reqwest::multipart::Part::bytes(attachment.bytes.clone()).file_name(attachment.filename.clone()));
                self.client.post(webhook_url).multipart(form)
            } else {
                self.client.post(webhook_url).json(&body)
            };

            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if Self::is_retryable(response.status()) && attempt < self.policy.max_retries => {
                    last_error = format!("HTTP {}", response.status());
                    tokio::time::sleep(self.policy.jittered_delay_for(attempt, attempt as u64)).await;
                }
                Ok(response) => {
                    return Err(WebhookError::SendFailed {
                        attempts: attempt + 1,
                        message: format!("HTTP {}", response.status()),
                    });
                }
                Err(e) if attempt < self.policy.max_retries => {
                    last_error = e.to_string();
                    tokio::time::sleep(self.policy.jittered_delay_for(attempt, attempt as u64)).await;
                }
                Err(e) => {
                    return Err(WebhookError::SendFailed { attempts: attempt + 1, message: e.to_string() });
                }
            }
        }
        Err(WebhookError::SendFailed { attempts: self.policy.max_retries + 1, message: last_error })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeWebhookTransport {
        inner: Arc<Mutex<FakeWebhookState>>,
    }

    #[derive(Default)]
    struct FakeWebhookState {
        sent: Vec<(String, WebhookPayload)>,
        fail_with: Option<String>,
    }

    impl FakeWebhookTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_with(&self, reason: impl Into<String>) {
            self.inner.lock().fail_with = Some(reason.into());
        }

        pub fn sent(&self) -> Vec<(String, WebhookPayload)> {
            self.inner.lock().sent.clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for FakeWebhookTransport {
        async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), WebhookError> {
            let mut state = self.inner.lock();
            if let Some(reason) = state.fail_with.clone() {
                return Err(WebhookError::SendFailed { attempts: 1, message: reason });
            }
            state.sent.push((webhook_url.to_string(), payload.clone()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWebhookTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy { max_retries: 5, base_delay: Duration::from_millis(100), max_delay: Duration::from_secs(1), jitter: false };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10), Duration::from_secs(1));
    }

    #[test]
    fn attachment_within_limit_is_a_single_payload() {
        let attachment = FileAttachment { filename: "report.html".to_string(), bytes: vec![0u8; 16] };
        let payloads = chunk_attachment(None, None, attachment);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].attachment.as_ref().unwrap().filename, "report.html");
    }

    #[test]
    fn oversized_attachment_splits_into_part_k_of_n_payloads() {
        let bytes = vec![7u8; ATTACHMENT_CHUNK_LIMIT * 2 + 10];
        let attachment = FileAttachment { filename: "report.html".to_string(), bytes: bytes.clone() };
        let embed = EmbedPayload { title: "t".to_string(), description: "d".to_string(), color: 0, timestamp: "now".to_string(), fields: vec![], footer: None };
        let payloads = chunk_attachment(Some("hi".to_string()), Some(embed), attachment);

        assert_eq!(payloads.len(), 3);
        assert!(payloads[0].embed.is_some());
        assert_eq!(payloads[0].attachment.as_ref().unwrap().filename, "report.html.part1");
        assert!(payloads[1].embed.is_none());
        assert_eq!(payloads[1].content.as_deref(), Some("part 2/3"));
        assert_eq!(payloads[2].attachment.as_ref().unwrap().filename, "report.html.part3");

        let reassembled: Vec<u8> = payloads.iter().flat_map(|p| p.attachment.as_ref().unwrap().bytes.clone()).collect();
        assert_eq!(reassembled, bytes);
    }

    #[test]
    fn jitter_never_exceeds_ten_percent() {
        let policy = RetryPolicy { max_retries: 5, base_delay: Duration::from_secs(1), max_delay: Duration::from_secs(30), jitter: true };
        for salt in 0..20u64 {
            let jittered = policy.jittered_delay_for(1, salt);
            assert!(jittered >= policy.delay_for(1));
            assert!(jittered <= policy.delay_for(1) + Duration::from_millis(200));
        }
    }
}
