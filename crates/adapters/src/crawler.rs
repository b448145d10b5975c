// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crawler collaborator (spec §1 "explicitly out of scope... the HTML crawler
//! engine"; consumed here through a narrow interface, spec §4.8 step 3).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("crawl failed for {seed}: {reason}")]
    Failed { seed: String, reason: String },
}

/// Expands a set of seed URLs into a bounded set of discovered URLs.
#[async_trait]
pub trait CrawlerAdapter: Send + Sync + 'static {
    async fn crawl(&self, seeds: &[String], max_urls: usize) -> Result<Vec<String>, CrawlerError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CrawlerAdapter, CrawlerError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake crawler returning a fixed discovered set regardless of seeds,
    /// or an injected failure.
    #[derive(Clone, Default)]
    pub struct FakeCrawlerAdapter {
        inner: Arc<Mutex<FakeCrawlerState>>,
    }

    #[derive(Default)]
    struct FakeCrawlerState {
        discovered: Vec<String>,
        fail_with: Option<String>,
        calls: Vec<Vec<String>>,
    }

    impl FakeCrawlerAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_discovered(discovered: Vec<String>) -> Self {
            let this = Self::new();
            this.inner.lock().discovered = discovered;
            this
        }

        pub fn fail_with(&self, reason: impl Into<String>) {
            self.inner.lock().fail_with = Some(reason.into());
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl CrawlerAdapter for FakeCrawlerAdapter {
        async fn crawl(&self, seeds: &[String], max_urls: usize) -> Result<Vec<String>, CrawlerError> {
            let mut state = self.inner.lock();
            state.calls.push(seeds.to_vec());
            if let Some(reason) = state.fail_with.clone() {
                return Err(CrawlerError::Failed {
                    seed: seeds.first().cloned().unwrap_or_default(),
                    reason,
                });
            }
            let mut discovered = state.discovered.clone();
            discovered.truncate(max_urls);
            Ok(discovered)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCrawlerAdapter;
