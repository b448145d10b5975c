// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret Detector output (spec §4.6, component C6).

use serde::{Deserialize, Serialize};

/// One regex match against a probed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFinding {
    pub rule_id: String,
    pub description: String,
    pub source_url: String,
    /// Redacted: first 4 and last 4 characters kept, middle masked.
    pub secret_text: String,
    pub line_number: usize,
    pub found_at_ms: u64,
}

impl SecretFinding {
    /// Dedup key: `(source_url, secret_text, rule_id)` (spec §9 Open
    /// Question, resolved in favor of including `rule_id`).
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.source_url, &self.secret_text, &self.rule_id)
    }
}

/// Mask `text` keeping the first and last `keep` characters, per side.
/// Short inputs (`<= keep * 2`) are masked entirely to avoid leaking a
/// short secret in full.
pub fn redact(text: &str, keep: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= keep * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - keep * 2))
}
