// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-safe sanitization for on-disk file/directory names (spec §6).
//!
//! `sanitize` is a pure function: replace `:`, `/`, and anything outside
//! `[A-Za-z0-9_.-]` with `_`, collapse consecutive `_`, trim leading/trailing
//! `_`. `restore_host_port` reverses only the final `_<digits>` back to
//! `:<digits>`, which is enough to recover a `host:port` pair that was
//! sanitized by this function and nothing else.

/// Sanitize an arbitrary string into a path-safe component.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_underscore = false;
    for c in input.chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' { c } else { '_' };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        out.push(mapped);
    }
    out.trim_matches('_').to_string()
}

/// Reverse `sanitize` for a `host:port` string: restores the final
/// `_<digits>` suffix to `:<digits>`. Only valid when the input to
/// `sanitize` was itself a `host:port` pair (the host may legitimately
/// contain further sanitized `_`s from dots, which this does not touch).
pub fn restore_host_port(sanitized: &str) -> String {
    if let Some(idx) = sanitized.rfind('_') {
        let (head, tail) = sanitized.split_at(idx);
        let digits = &tail[1..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return format!("{head}:{digits}");
        }
    }
    sanitized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_colon_and_slash() {
        assert_eq!(sanitize("https://example.com:8080/path"), "https_example.com_8080_path");
    }

    #[test]
    fn sanitize_collapses_consecutive_underscores() {
        assert_eq!(sanitize("a://///b"), "a_b");
    }

    #[test]
    fn sanitize_trims_leading_trailing_underscore() {
        assert_eq!(sanitize("://example.com://"), "example.com");
    }

    #[test]
    fn host_port_round_trips() {
        let host_port = "example.com:8080";
        let sanitized = sanitize(host_port);
        assert_eq!(sanitized, "example.com_8080");
        assert_eq!(restore_host_port(&sanitized), host_port);
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["example.com:8080", "https://a.test/b/c", "weird!!chars***"] {
            let once = sanitize(raw);
            let twice = sanitize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn sanitize_then_restore_fixed_point() {
        // Testable property from spec §8: sanitize(restore(sanitize(x))) == sanitize(x)
        let host_port = "my-host.example.com:9443";
        let s = sanitize(host_port);
        let restored = restore_host_port(&s);
        assert_eq!(sanitize(&restored), s);
    }
}
