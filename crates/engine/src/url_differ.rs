// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL Differ (spec §4.4, component C4): classify URLs against the prior
//! snapshot for the same root target.

use recon_core::{ProbeResult, UrlStatus};
use std::collections::HashMap;

/// Classify `current` against `prior` (keyed by `input_url`), returning
/// `current` annotated with `url_status`/`first_seen_ms` plus synthetic
/// `old` entries for URLs present in `prior` but absent from `current`.
///
/// Total: `|new| + |existing| = |current|` and `|existing| + |old| =
/// |prior|` (spec §8).
pub fn diff_urls(
    current: Vec<ProbeResult>,
    prior: &HashMap<String, ProbeResult>,
    now_ms: u64,
) -> Vec<ProbeResult> {
    let mut seen = std::collections::HashSet::with_capacity(current.len());
    let mut out = Vec::with_capacity(current.len() + prior.len());

    for mut result in current {
        seen.insert(result.input_url.clone());
        match prior.get(&result.input_url) {
            Some(previous) => {
                result.url_status = UrlStatus::Existing;
                result.first_seen_ms = previous.first_seen_ms;
                result.last_seen_ms = now_ms;
            }
            None => {
                result.url_status = UrlStatus::New;
                result.first_seen_ms = now_ms;
                result.last_seen_ms = now_ms;
            }
        }
        out.push(result);
    }

    let mut old_entries: Vec<ProbeResult> = prior
        .values()
        .filter(|r| !seen.contains(&r.input_url))
        .cloned()
        .map(|mut r| {
            r.url_status = UrlStatus::Old;
            r.last_seen_ms = now_ms;
            r
        })
        .collect();
    // Deterministic ordering for identical inputs (spec §4.4: "ties are
    // broken by comparing URL byte-lexicographically").
    old_entries.sort_by(|a, b| a.input_url.cmp(&b.input_url));
    out.extend(old_entries);
    out
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffCounts {
    pub new: usize,
    pub existing: usize,
    pub old: usize,
}

pub fn count_statuses(results: &[ProbeResult]) -> DiffCounts {
    let mut counts = DiffCounts::default();
    for r in results {
        match r.url_status {
            UrlStatus::New => counts.new += 1,
            UrlStatus::Existing => counts.existing += 1,
            UrlStatus::Old => counts.old += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::test_support::probe_result;

    fn with_seen(mut r: ProbeResult, first_seen_ms: u64) -> ProbeResult {
        r.first_seen_ms = first_seen_ms;
        r.last_seen_ms = first_seen_ms;
        r
    }

    #[test]
    fn all_new_when_no_prior_snapshot() {
        let current = vec![probe_result("https://a.test/", "https://a.test", UrlStatus::New)];
        let result = diff_urls(current, &HashMap::new(), 1000);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].url_status, UrlStatus::New);
    }

    #[test]
    fn existing_preserves_first_seen_and_removed_becomes_old() {
        let mut prior = HashMap::new();
        prior.insert(
            "https://a.test/keep".to_string(),
            with_seen(probe_result("https://a.test/keep", "https://a.test", UrlStatus::New), 100),
        );
        prior.insert(
            "https://a.test/gone".to_string(),
            with_seen(probe_result("https://a.test/gone", "https://a.test", UrlStatus::New), 50),
        );

        let current = vec![probe_result("https://a.test/keep", "https://a.test", UrlStatus::New)];
        let result = diff_urls(current, &prior, 999);

        let counts = count_statuses(&result);
        assert_eq!(counts, DiffCounts { new: 0, existing: 1, old: 1 });

        let keep = result.iter().find(|r| r.input_url == "https://a.test/keep").unwrap();
        assert_eq!(keep.first_seen_ms, 100);
        assert_eq!(keep.last_seen_ms, 999);

        let gone = result.iter().find(|r| r.input_url == "https://a.test/gone").unwrap();
        assert_eq!(gone.url_status, UrlStatus::Old);
        assert_eq!(gone.first_seen_ms, 50);
    }

    #[test]
    fn diff_is_total_over_universes() {
        let mut prior = HashMap::new();
        for u in ["https://a.test/1", "https://a.test/2", "https://a.test/3"] {
            prior.insert(u.to_string(), with_seen(probe_result(u, "https://a.test", UrlStatus::New), 1));
        }
        let current: Vec<_> =
            ["https://a.test/2", "https://a.test/3", "https://a.test/4"]
                .into_iter()
                .map(|u| probe_result(u, "https://a.test", UrlStatus::New))
                .collect();

        let result = diff_urls(current.clone(), &prior, 2);
        let counts = count_statuses(&result);
        assert_eq!(counts.new + counts.existing, current.len());
        assert_eq!(counts.existing + counts.old, prior.len());
    }
}
