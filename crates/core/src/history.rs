// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! History record data model (spec §3). Storage and codec concerns live in
//! `recon-storage`; this crate only owns the shape of the record.

use serde::{Deserialize, Serialize};

/// Append-only per-URL history entry (spec §3 `FileHistoryRecord`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHistoryRecord {
    pub url: String,
    pub timestamp_ms: u64,
    /// Hex-encoded SHA-256 of `content_bytes`.
    pub content_hash: String,
    pub content_bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified_hdr: Option<String>,
    pub diff_json: Option<String>,
    pub extracted_paths_json: Option<String>,
}

impl FileHistoryRecord {
    /// Two records are duplicates (spec §3 invariant: `(content_hash,
    /// timestamp_ms)` uniquely identifies a record) when both match.
    pub fn is_duplicate_of(&self, other: &FileHistoryRecord) -> bool {
        self.content_hash == other.content_hash && self.timestamp_ms == other.timestamp_ms
    }
}
