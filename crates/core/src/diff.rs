// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content diff output (spec §4.5, component C5). Persisted as JSON inside
//! `FileHistoryRecord::diff_json`.

use serde::{Deserialize, Serialize};

/// A single added/removed line, 1-indexed within its respective body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub line_number: usize,
    pub text: String,
}

/// Structured line-level diff plus extracted path list (spec §4.5).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDiff {
    /// True when `previous_bytes == current_bytes` (cheap short-circuit);
    /// `added`/`removed` are empty when this is true.
    pub unchanged: bool,
    /// True for non-text content types: only the hash is compared, no
    /// line-level diff is produced.
    pub binary: bool,
    pub added: Vec<LineChange>,
    pub removed: Vec<LineChange>,
    pub extracted_paths: Vec<String>,
}
