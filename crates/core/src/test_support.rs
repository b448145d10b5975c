// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and proptest strategies shared by other crates' tests.

use crate::probe::{ProbeResult, UrlStatus};
use proptest::prelude::*;
use std::collections::HashMap;

pub fn probe_result(input_url: &str, root_target: &str, status: UrlStatus) -> ProbeResult {
    ProbeResult {
        input_url: input_url.to_string(),
        final_url: input_url.to_string(),
        status_code: Some(200),
        content_length: Some(0),
        content_type: Some("text/html".to_string()),
        title: None,
        server: None,
        technologies: Vec::new(),
        ips: Vec::new(),
        headers: HashMap::new(),
        error: None,
        method: "GET".to_string(),
        root_target: root_target.to_string(),
        url_status: status,
        first_seen_ms: 0,
        last_seen_ms: 0,
        scan_session_id: "test-session".to_string(),
    }
}

/// Arbitrary hostname-ish strings for the normalize idempotence property.
pub fn arb_host() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,6}){1,2}".prop_map(|s| s)
}
