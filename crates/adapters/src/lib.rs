// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! recon-adapters: trait boundaries around the collaborators spec §1 treats
//! as out of scope (crawler engine, probing library, report renderer,
//! webhook transport), plus fakes behind `test-support` for exercising
//! `recon-engine` without real I/O.

pub mod crawler;
pub mod prober;
pub mod reporter;
pub mod webhook;

pub use crawler::{CrawlerAdapter, CrawlerError};
pub use prober::{FetchOutcome, FetcherAdapter, HttpFetcherAdapter, ProberAdapter, ProberError};
pub use reporter::{ReporterAdapter, ReporterError};
pub use webhook::{
    chunk_attachment, EmbedField, EmbedPayload, FileAttachment, RetryPolicy, WebhookError, WebhookPayload, WebhookTransport,
    ATTACHMENT_CHUNK_LIMIT,
};

#[cfg(any(test, feature = "test-support"))]
pub use crawler::FakeCrawlerAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use prober::{FakeFetcherAdapter, FakeProberAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use reporter::FakeReporterAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use webhook::FakeWebhookTransport;
