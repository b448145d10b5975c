// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe-Result Store (spec §4.3, component C3): one file per root target
//! under `<base>/scan/<sanitized-root-target>.parquet`, fully replaced on
//! every write.

use crate::codec::Codec;
use crate::error::StorageError;
use crate::parquet_io::{field_i64, field_str, read_rows, write_rows};
use crate::sanitize::sanitize;
use parquet_derive::ParquetRecordWriter;
use recon_core::{ProbeResult, UrlStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

#[derive(ParquetRecordWriter)]
struct ProbeRow {
    input_url: String,
    final_url: String,
    status_code: Option<i64>,
    content_length: Option<i64>,
    content_type: Option<String>,
    title: Option<String>,
    server: Option<String>,
    technologies_json: String,
    ips_json: String,
    headers_json: String,
    error: Option<String>,
    method: String,
    root_target: String,
    url_status: String,
    first_seen_ms: i64,
    last_seen_ms: i64,
    scan_session_id: String,
}

impl From<&ProbeResult> for ProbeRow {
    fn from(r: &ProbeResult) -> Self {
        ProbeRow {
            input_url: r.input_url.clone(),
            final_url: r.final_url.clone(),
            status_code: r.status_code.map(i64::from),
            content_length: r.content_length.map(|v| v as i64),
            content_type: r.content_type.clone(),
            title: r.title.clone(),
            server: r.server.clone(),
            technologies_json: serde_json::to_string(&r.technologies).unwrap_or_default(),
            ips_json: serde_json::to_string(&r.ips).unwrap_or_default(),
            headers_json: serde_json::to_string(&r.headers).unwrap_or_default(),
            error: r.error.clone(),
            method: r.method.clone(),
            root_target: r.root_target.clone(),
            url_status: r.url_status.to_string(),
            first_seen_ms: r.first_seen_ms as i64,
            last_seen_ms: r.last_seen_ms as i64,
            scan_session_id: r.scan_session_id.clone(),
        }
    }
}

fn row_to_result(row: &parquet::record::Row) -> Option<ProbeResult> {
    let url_status = match field_str(row, "url_status")?.as_str() {
        "new" => UrlStatus::New,
        "existing" => UrlStatus::Existing,
        "old" => UrlStatus::Old,
        _ => return None,
    };
    Some(ProbeResult {
        input_url: field_str(row, "input_url")?,
        final_url: field_str(row, "final_url")?,
        status_code: field_i64(row, "status_code").map(|v| v as u16),
        content_length: field_i64(row, "content_length").map(|v| v as u64),
        content_type: field_str(row, "content_type"),
        title: field_str(row, "title"),
        server: field_str(row, "server"),
        technologies: field_str(row, "technologies_json").and_then(|j| serde_json::from_str(&j).ok()).unwrap_or_default(),
        ips: field_str(row, "ips_json").and_then(|j| serde_json::from_str(&j).ok()).unwrap_or_default(),
        headers: field_str(row, "headers_json").and_then(|j| serde_json::from_str(&j).ok()).unwrap_or_default(),
        error: field_str(row, "error"),
        method: field_str(row, "method")?,
        root_target: field_str(row, "root_target")?,
        url_status,
        first_seen_ms: field_i64(row, "first_seen_ms")? as u64,
        last_seen_ms: field_i64(row, "last_seen_ms")? as u64,
        scan_session_id: field_str(row, "scan_session_id")?,
    })
}

/// Snapshot store for the latest probe results per root target.
pub struct ProbeResultStore {
    base: PathBuf,
    codec: Codec,
    write_lock: tokio::sync::Mutex<()>,
}

impl ProbeResultStore {
    pub fn new(base: impl Into<PathBuf>, codec: Codec) -> Self {
        Self { base: base.into(), codec, write_lock: tokio::sync::Mutex::new(()) }
    }

    fn path_for(&self, root_target: &str) -> PathBuf {
        self.base.join("scan").join(format!("{}.parquet", sanitize(root_target)))
    }

    /// Replace the snapshot for `root_target` with `results`.
    ///
    /// Cancellation-sensitive per spec §4.3: checked before file creation,
    /// every 100 rows during transformation, and before finalizing. On
    /// cancel, the partial temp file is removed and no file is left at
    /// `path`.
    pub async fn write(
        &self,
        results: &[ProbeResult],
        _session_id: &str,
        root_target: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(root_target);

        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));

        let mut rows = Vec::with_capacity(results.len());
        for (i, r) in results.iter().enumerate() {
            if i % 100 == 0 && cancel.is_cancelled() {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(StorageError::Cancelled);
            }
            rows.push(ProbeRow::from(r));
        }

        if cancel.is_cancelled() {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StorageError::Cancelled);
        }

        if let Err(e) = write_rows(&tmp_path, &rows, self.codec) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, &path).map_err(|e| StorageError::io(&path, e))?;
        Ok(())
    }

    /// All results for `root_target` plus the snapshot file's mtime, if any.
    pub fn find_all_for_target(
        &self,
        root_target: &str,
    ) -> Result<(Vec<ProbeResult>, Option<SystemTime>), StorageError> {
        let path = self.path_for(root_target);
        if !path.exists() {
            return Ok((Vec::new(), None));
        }
        let mtime = std::fs::metadata(&path).ok().and_then(|m| m.modified().ok());
        let rows = read_rows(&path)?;
        Ok((rows.iter().filter_map(row_to_result).collect(), mtime))
    }

    /// Index the latest snapshot's probe results by normalized `input_url`,
    /// the key the URL Differ (C4) compares on.
    pub fn latest_by_url(&self, root_target: &str) -> Result<HashMap<String, ProbeResult>, StorageError> {
        let (results, _) = self.find_all_for_target(root_target)?;
        Ok(results.into_iter().map(|r| (r.input_url.clone(), r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::test_support::probe_result;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        let results = vec![
            probe_result("https://a.test/", "https://a.test", UrlStatus::New),
            probe_result("https://a.test/x", "https://a.test", UrlStatus::Existing),
        ];
        store.write(&results, "20240101-000000", "https://a.test", &CancellationToken::new()).await.unwrap();

        let (read_back, mtime) = store.find_all_for_target("https://a.test").unwrap();
        assert_eq!(read_back.len(), 2);
        assert!(mtime.is_some());
    }

    #[tokio::test]
    async fn write_fully_replaces_prior_contents() {
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        store
            .write(
                &[probe_result("https://a.test/old", "https://a.test", UrlStatus::New)],
                "s1",
                "https://a.test",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        store
            .write(
                &[probe_result("https://a.test/new", "https://a.test", UrlStatus::New)],
                "s2",
                "https://a.test",
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let (read_back, _) = store.find_all_for_target("https://a.test").unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].input_url, "https://a.test/new");
    }

    #[tokio::test]
    async fn cancelled_write_leaves_no_file() {
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = store
            .write(
                &[probe_result("https://a.test/", "https://a.test", UrlStatus::New)],
                "s1",
                "https://a.test",
                &cancel,
            )
            .await;
        assert!(err.is_err());
        assert!(!store.path_for("https://a.test").exists());
    }

    #[test]
    fn missing_target_returns_empty() {
        let dir = tempdir().unwrap();
        let store = ProbeResultStore::new(dir.path(), Codec::Uncompressed);
        let (results, mtime) = store.find_all_for_target("https://never.test").unwrap();
        assert!(results.is_empty());
        assert!(mtime.is_none());
    }
}
