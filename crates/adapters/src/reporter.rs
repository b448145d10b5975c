// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report renderer collaborator (spec §1 "the HTML report renderer", §4.8
//! step 7).

use async_trait::async_trait;
use recon_core::ProbeResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("report generation failed: {0}")]
    GenerationFailed(String),
}

/// Renders a scan's probe results to one or more report files, returning
/// their paths.
#[async_trait]
pub trait ReporterAdapter: Send + Sync + 'static {
    async fn generate(
        &self,
        session_id: &str,
        root_target: &str,
        results: &[ProbeResult],
    ) -> Result<Vec<String>, ReporterError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeReporterAdapter {
        inner: Arc<Mutex<FakeReporterState>>,
    }

    #[derive(Default)]
    struct FakeReporterState {
        paths: Vec<String>,
        fail_with: Option<String>,
    }

    impl FakeReporterAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_paths(paths: Vec<String>) -> Self {
            let this = Self::new();
            this.inner.lock().paths = paths;
            this
        }

        pub fn fail_with(&self, reason: impl Into<String>) {
            self.inner.lock().fail_with = Some(reason.into());
        }
    }

    #[async_trait]
    impl ReporterAdapter for FakeReporterAdapter {
        async fn generate(
            &self,
            _session_id: &str,
            _root_target: &str,
            _results: &[ProbeResult],
        ) -> Result<Vec<String>, ReporterError> {
            let state = self.inner.lock();
            if let Some(reason) = state.fail_with.clone() {
                return Err(ReporterError::GenerationFailed(reason));
            }
            Ok(state.paths.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReporterAdapter;
