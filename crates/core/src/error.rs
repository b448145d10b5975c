// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the reconnaissance engine (spec §4.12/§7).
//!
//! Leaf crates define their own `thiserror` error types and convert into
//! `RecoError` at their public boundary with `#[from]`, which preserves the
//! cause chain for `source()`-based unwrapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured validation failure: a single offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("invalid {field} = {value:?}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    pub message: String,
}

/// A network-layer failure, with the URL and an optional underlying cause
/// message (causes aren't `Clone`/`Serialize`-friendly, so we keep the
/// rendered string rather than the original error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("network error for {url}: {reason}")]
pub struct NetworkError {
    pub url: String,
    pub reason: String,
    pub cause: Option<String>,
}

/// A non-2xx/304 HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("HTTP {status} for {url}: {message}")]
pub struct HttpError {
    pub status: u16,
    pub url: String,
    pub message: String,
}

/// Top-level error kind taxonomy (spec §4.12).
#[derive(Debug, Error)]
pub enum RecoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("network failure: {0}")]
    NetworkFailure(#[from] NetworkError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("http error: {0}")]
    Http(#[from] HttpError),

    #[error("{context}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RecoError {
    /// Wrap any error with additional context, preserving the cause chain.
    pub fn wrap(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RecoError::Wrapped { context: context.into(), source: Box::new(source) }
    }
}
