// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content Differ (spec §4.5, component C5): line-level diff plus
//! extracted-path list, persisted as JSON inside a history record.

use recon_core::{ContentDiff, LineChange};
use similar::{ChangeTag, TextDiff};
use std::sync::OnceLock;

/// A URL-like path regex applied to text bodies to surface referenced
/// endpoints (e.g. from JS source maps or hardcoded API routes).
fn path_regex() -> &'static regex::Regex {
    static PATH_REGEX: OnceLock<regex::Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| {
        regex::Regex::new(r#"["'](/[a-zA-Z0-9_\-./]{2,}(?:\?[a-zA-Z0-9_=&%\-.]+)?)["']"#)
            .expect("static path regex must compile")
    })
}

fn is_text_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => false,
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("text/")
                || ct.contains("json")
                || ct.contains("javascript")
                || ct.contains("xml")
                || ct.contains("html")
        }
    }
}

/// Diff `previous_bytes` against `current_bytes`. Content types outside the
/// text/JSON/JS/XML/HTML family are diffed only by hash — `binary` is set
/// and no line-level diff is produced (spec §4.5).
pub fn diff_content(previous_bytes: &[u8], current_bytes: &[u8], content_type: Option<&str>) -> ContentDiff {
    if previous_bytes == current_bytes {
        return ContentDiff { unchanged: true, ..Default::default() };
    }

    if !is_text_content_type(content_type) {
        return ContentDiff { binary: true, ..Default::default() };
    }

    let previous_text = String::from_utf8_lossy(previous_bytes);
    let current_text = String::from_utf8_lossy(current_bytes);

    let text_diff = TextDiff::from_lines(previous_text.as_ref(), current_text.as_ref());
    let mut added = Vec::new();
    let mut removed = Vec::new();

    for change in text_diff.iter_all_changes() {
        let text = change.value().trim_end_matches('\n').to_string();
        match change.tag() {
            ChangeTag::Insert => {
                if let Some(idx) = change.new_index() {
                    added.push(LineChange { line_number: idx + 1, text });
                }
            }
            ChangeTag::Delete => {
                if let Some(idx) = change.old_index() {
                    removed.push(LineChange { line_number: idx + 1, text });
                }
            }
            ChangeTag::Equal => {}
        }
    }

    let extracted_paths = extract_paths(&current_text);

    ContentDiff { unchanged: false, binary: false, added, removed, extracted_paths }
}

fn extract_paths(text: &str) -> Vec<String> {
    let mut paths: Vec<String> = path_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_are_unchanged() {
        let diff = diff_content(b"same", b"same", Some("text/plain"));
        assert!(diff.unchanged);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn binary_content_skips_line_diff() {
        let diff = diff_content(b"\x00\x01", b"\x00\x02", Some("application/octet-stream"));
        assert!(diff.binary);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
    }

    #[test]
    fn text_diff_reports_added_and_removed_lines() {
        let previous = "line one\nline two\n";
        let current = "line one\nline three\n";
        let diff = diff_content(previous.as_bytes(), current.as_bytes(), Some("text/plain"));
        assert!(!diff.unchanged && !diff.binary);
        assert_eq!(diff.removed.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["line two"]);
        assert_eq!(diff.added.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["line three"]);
    }

    #[test]
    fn extracts_quoted_path_like_strings() {
        let body = r#"fetch("/api/v1/users?active=true"); var x = '/static/app.js';"#;
        let diff = diff_content(b"", body.as_bytes(), Some("application/javascript"));
        assert!(diff.extracted_paths.contains(&"/api/v1/users?active=true".to_string()));
        assert!(diff.extracted_paths.contains(&"/static/app.js".to_string()));
    }
}
