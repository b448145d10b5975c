// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target identity: the original URL text paired with its canonical form.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A target URL, immutable once constructed.
///
/// `original` preserves exactly what was read from the target file;
/// `normalized` is the canonical form used for dedup, diffing, and
/// storage-path derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub original: String,
    pub normalized: String,
}

impl Target {
    /// Parse and normalize `raw`, producing a `Target`.
    ///
    /// Normalization: add `http://` when the scheme is missing, lowercase
    /// scheme and host, strip the fragment. URLs without a hostname are
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = normalize(raw)?;
        Ok(Target { original: raw.to_string(), normalized })
    }

    pub fn host_port(&self) -> Option<String> {
        host_port_of(&self.normalized)
    }
}

/// Normalize a URL string per the rules above. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") { trimmed.to_string() } else { format!("http://{trimmed}") };

    let mut url = Url::parse(&candidate).map_err(|e| ValidationError {
        field: "url".to_string(),
        value: raw.to_string(),
        message: format!("unparseable URL: {e}"),
    })?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError {
            field: "url".to_string(),
            value: raw.to_string(),
            message: "URL has no hostname".to_string(),
        });
    }

    let scheme = url.scheme().to_ascii_lowercase();
    url.set_scheme(&scheme).ok();
    if let Some(host) = url.host_str() {
        let lowered = host.to_ascii_lowercase();
        url.set_host(Some(&lowered)).map_err(|e| ValidationError {
            field: "url".to_string(),
            value: raw.to_string(),
            message: format!("invalid host: {e}"),
        })?;
    }
    url.set_fragment(None);

    Ok(url.to_string())
}

fn host_port_of(normalized: &str) -> Option<String> {
    let url = Url::parse(normalized).ok()?;
    let host = url.host_str()?;
    match url.port_or_known_default() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}
