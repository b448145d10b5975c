// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cycle/session identity: a monotonically formatted `YYYYMMDD-HHMMSS` timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a scan session or monitor cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(String);

impl CycleId {
    /// Build a cycle id from milliseconds-since-epoch (UTC).
    pub fn from_epoch_ms(epoch_ms: u64) -> Self {
        let dt: DateTime<Utc> = DateTime::from_timestamp_millis(epoch_ms as i64).unwrap_or_default();
        Self(dt.format("%Y%m%d-%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CycleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_compact_timestamp() {
        // 2024-01-02T03:04:05Z
        let ms = 1_704_168_245_000u64;
        let id = CycleId::from_epoch_ms(ms);
        assert_eq!(id.as_str(), "20240102-030405");
    }

    #[test]
    fn monotonic_for_increasing_epoch() {
        let a = CycleId::from_epoch_ms(1_700_000_000_000);
        let b = CycleId::from_epoch_ms(1_700_000_001_000);
        assert!(a.as_str() < b.as_str());
    }
}
