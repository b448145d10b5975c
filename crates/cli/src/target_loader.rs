// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target Loader (spec §4.11, component C11): reads a target file into a
//! normalized, deduplicated, order-preserving URL list.

use recon_core::target::normalize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetLoaderError {
    #[error("failed to read target file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read `path` line by line: strip whitespace, drop empty/`#`-comment
/// lines, normalize each URL, reject invalid ones silently, dedupe
/// preserving first-seen order.
///
/// A file that parses but yields zero valid targets (all comments, all
/// blank, all invalid) is `Ok(vec![])`, not an error: spec.md scenario 1
/// requires `--mode onetime --st <all-comment file>` to reach the Scan
/// Pipeline's own `NoTargets` handling (a single `NoTargets` notification,
/// exit code 0), not a hard CLI failure. The caller distinguishes "flag
/// omitted" from "flag given but empty" itself.
pub fn load_targets(path: &Path) -> Result<Vec<String>, TargetLoaderError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| TargetLoaderError::Io { path: path.display().to_string(), source })?;

    let mut seen = std::collections::HashSet::new();
    let mut targets = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Ok(normalized) = normalize(trimmed) else {
            continue;
        };
        if seen.insert(normalized.clone()) {
            targets.push(normalized);
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn strips_comments_blank_lines_and_whitespace() {
        let file = write_file("  example.com  \n\n# a comment\nfoo.test\n");
        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets, vec!["http://example.com/", "http://foo.test/"]);
    }

    #[test]
    fn dedupes_after_normalization_preserving_order() {
        let file = write_file("example.com\nEXAMPLE.COM\nother.test\n");
        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets, vec!["http://example.com/", "http://other.test/"]);
    }

    #[test]
    fn drops_invalid_lines_without_failing_the_whole_file() {
        let file = write_file("file:///etc/passwd\nexample.com\n");
        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets, vec!["http://example.com/"]);
    }

    #[test]
    fn all_comment_file_yields_an_empty_target_list() {
        let file = write_file("# just a comment\n\n");
        let targets = load_targets(file.path()).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn missing_file_is_a_typed_io_error() {
        let err = load_targets(Path::new("/nonexistent/path/targets.txt")).unwrap_err();
        assert!(matches!(err, TargetLoaderError::Io { .. }));
    }
}
