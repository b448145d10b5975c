// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan/monitor cycle summaries (spec §3).

use crate::cycle::CycleId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single scan-pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Started,
    Completed,
    PartialComplete,
    Failed,
    Interrupted,
    NoTargets,
}

/// Summary of a scan pipeline invocation (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub session_id: CycleId,
    pub target_source: String,
    pub mode: String,
    pub targets: Vec<String>,
    pub probed: usize,
    pub successful: usize,
    pub failed: usize,
    pub diff_new: usize,
    pub diff_existing: usize,
    pub diff_old: usize,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub status: ScanStatus,
    pub errors: Vec<String>,
    /// Set for `Failed` summaries: the component that failed (spec §4.8).
    pub failed_component: Option<String>,
    pub report_paths: Vec<String>,
}

impl ScanSummary {
    pub fn started(session_id: CycleId, target_source: impl Into<String>, mode: impl Into<String>) -> Self {
        ScanSummary {
            session_id,
            target_source: target_source.into(),
            mode: mode.into(),
            targets: Vec::new(),
            probed: 0,
            successful: 0,
            failed: 0,
            diff_new: 0,
            diff_existing: 0,
            diff_old: 0,
            duration: Duration::ZERO,
            status: ScanStatus::Started,
            errors: Vec::new(),
            failed_component: None,
            report_paths: Vec::new(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
