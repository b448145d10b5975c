// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probing collaborator (spec §1 "the HTTP probing library itself... an
//! external capability that returns a result record per URL", §4.8 step 4).

use async_trait::async_trait;
use recon_core::ProbeResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProberError {
    #[error("probe engine initialization failed: {0}")]
    InitFailed(String),
    #[error("fetch returned non-2xx/304 status {status}")]
    HttpStatus { status: u16 },
}

/// Produces a `ProbeResult` per URL, with bounded concurrency left to the
/// implementation. URLs the prober cannot reach are still represented with
/// an `error`-bearing result rather than omitted, except when initialization
/// itself fails (that is a pipeline-level `ProberError`).
#[async_trait]
pub trait ProberAdapter: Send + Sync + 'static {
    async fn probe(&self, urls: &[String], concurrency: usize) -> Result<Vec<ProbeResult>, ProberError>;
}

/// Fetches a single URL for the monitor pipeline (C9), honoring conditional
/// request headers. Distinct from `ProberAdapter` because the monitor loop
/// needs raw bytes plus cache-validation headers, not the structured
/// technology-detection output a scan probe produces.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status_code: Option<u16>,
    pub not_modified: bool,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified_hdr: Option<String>,
}

#[async_trait]
pub trait FetcherAdapter: Send + Sync + 'static {
    async fn fetch(
        &self,
        url: &str,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> Result<FetchOutcome, ProberError>;
}

/// Production fetcher issuing a conditional GET per call. Mechanically
/// self-contained (unlike `ProberAdapter`, which needs root-target/session
/// context its trait signature doesn't carry), so unlike the crawler and
/// probing-engine collaborators this one gets a real implementation here.
pub struct HttpFetcherAdapter {
    client: reqwest::Client,
}

impl HttpFetcherAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetcherAdapter for HttpFetcherAdapter {
    async fn fetch(
        &self,
        url: &str,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> Result<FetchOutcome, ProberError> {
        let mut request = self.client.get(url);
        if let Some(etag) = if_none_match {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = if_modified_since {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(|e| ProberError::InitFailed(e.to_string()))?;
        let status_code = response.status().as_u16();
        if status_code == 304 {
            return Ok(FetchOutcome { status_code: Some(status_code), not_modified: true, body: Vec::new(), content_type: None, etag: None, last_modified_hdr: None });
        }
        // spec §4.9: "Fetching -> Errored on transport error or non-2xx/304".
        if !response.status().is_success() {
            return Err(ProberError::HttpStatus { status: status_code });
        }

        let content_type = response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
        let etag = response.headers().get(reqwest::header::ETAG).and_then(|v| v.to_str().ok()).map(str::to_string);
        let last_modified_hdr = response.headers().get(reqwest::header::LAST_MODIFIED).and_then(|v| v.to_str().ok()).map(str::to_string);
        let body = response.bytes().await.map_err(|e| ProberError::InitFailed(e.to_string()))?.to_vec();

        Ok(FetchOutcome { status_code: Some(status_code), not_modified: false, body, content_type, etag, last_modified_hdr })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeProberAdapter {
        inner: Arc<Mutex<HashMap<String, ProbeResult>>>,
    }

    impl FakeProberAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_result(&self, url: impl Into<String>, result: ProbeResult) {
            self.inner.lock().insert(url.into(), result);
        }
    }

    #[async_trait]
    impl ProberAdapter for FakeProberAdapter {
        async fn probe(&self, urls: &[String], _concurrency: usize) -> Result<Vec<ProbeResult>, ProberError> {
            let state = self.inner.lock();
            Ok(urls.iter().filter_map(|u| state.get(u).cloned()).collect())
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeFetcherAdapter {
        inner: Arc<Mutex<HashMap<String, FetchOutcome>>>,
    }

    impl FakeFetcherAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_outcome(&self, url: impl Into<String>, outcome: FetchOutcome) {
            self.inner.lock().insert(url.into(), outcome);
        }
    }

    #[async_trait]
    impl FetcherAdapter for FakeFetcherAdapter {
        async fn fetch(
            &self,
            url: &str,
            _if_none_match: Option<&str>,
            _if_modified_since: Option<&str>,
        ) -> Result<FetchOutcome, ProberError> {
            self.inner
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| ProberError::InitFailed(format!("no fake outcome configured for {url}")))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFetcherAdapter, FakeProberAdapter};
