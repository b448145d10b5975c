// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe result record (spec §3) produced by the probing collaborator and
//! annotated by the URL Differ (C4).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a URL stands relative to the prior snapshot for its root target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    New,
    Existing,
    Old,
}

impl std::fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UrlStatus::New => "new",
            UrlStatus::Existing => "existing",
            UrlStatus::Old => "old",
        };
        write!(f, "{s}")
    }
}

/// A record per probed URL (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub input_url: String,
    pub final_url: String,
    pub status_code: Option<u16>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub server: Option<String>,
    pub technologies: Vec<String>,
    pub ips: Vec<String>,
    pub headers: HashMap<String, String>,
    pub error: Option<String>,
    pub method: String,
    pub root_target: String,
    pub url_status: UrlStatus,
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
    pub scan_session_id: String,
}

impl ProbeResult {
    /// Build a placeholder result for a discovered URL that the prober never
    /// returned a record for (spec §4.8 step 4).
    pub fn placeholder(
        input_url: impl Into<String>,
        root_target: impl Into<String>,
        scan_session_id: impl Into<String>,
        error: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        let input_url = input_url.into();
        ProbeResult {
            final_url: input_url.clone(),
            input_url,
            status_code: None,
            content_length: None,
            content_type: None,
            title: None,
            server: None,
            technologies: Vec::new(),
            ips: Vec::new(),
            headers: HashMap::new(),
            error: Some(error.into()),
            method: "GET".to_string(),
            root_target: root_target.into(),
            url_status: UrlStatus::New,
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            scan_session_id: scan_session_id.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && matches!(self.status_code, Some(code) if (200..400).contains(&code))
    }
}
