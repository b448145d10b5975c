// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! History Store (spec §4.2, component C2): per-URL append-only log of
//! `{hash, timestamp, content, headers, diff-json}`, partitioned on disk by
//! host:port and a 16-hex-char hash of the normalized URL.

use crate::codec::Codec;
use crate::error::StorageError;
use crate::parquet_io::{field_bytes, field_i64, field_str, read_rows, write_rows};
use crate::sanitize::sanitize;
use parquet_derive::ParquetRecordWriter;
use recon_core::FileHistoryRecord;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

#[derive(ParquetRecordWriter)]
struct HistoryRow {
    url: String,
    timestamp_ms: i64,
    content_hash: String,
    content_bytes: Vec<u8>,
    content_type: Option<String>,
    etag: Option<String>,
    last_modified_hdr: Option<String>,
    diff_json: Option<String>,
    extracted_paths_json: Option<String>,
}

impl From<&FileHistoryRecord> for HistoryRow {
    fn from(r: &FileHistoryRecord) -> Self {
        HistoryRow {
            url: r.url.clone(),
            timestamp_ms: r.timestamp_ms as i64,
            content_hash: r.content_hash.clone(),
            content_bytes: r.content_bytes.clone(),
            content_type: r.content_type.clone(),
            etag: r.etag.clone(),
            last_modified_hdr: r.last_modified_hdr.clone(),
            diff_json: r.diff_json.clone(),
            extracted_paths_json: r.extracted_paths_json.clone(),
        }
    }
}

fn row_to_record(row: &parquet::record::Row) -> Option<FileHistoryRecord> {
    Some(FileHistoryRecord {
        url: field_str(row, "url")?,
        timestamp_ms: field_i64(row, "timestamp_ms")? as u64,
        content_hash: field_str(row, "content_hash")?,
        content_bytes: field_bytes(row, "content_bytes").unwrap_or_default(),
        content_type: field_str(row, "content_type"),
        etag: field_str(row, "etag"),
        last_modified_hdr: field_str(row, "last_modified_hdr"),
        diff_json: field_str(row, "diff_json"),
        extracted_paths_json: field_str(row, "extracted_paths_json"),
    })
}

/// Hash a normalized URL to the 16 hex characters used as its history
/// filename stem (spec §3/§6).
pub fn url_hash16(normalized_url: &str) -> String {
    let digest = Sha256::digest(normalized_url.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Per-URL append-only history, partitioned on disk as
/// `<base>/monitor/<sanitized host:port>/<16hex>_history.parquet`.
pub struct HistoryStore {
    base: PathBuf,
    codec: Codec,
    locks: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl HistoryStore {
    pub fn new(base: impl Into<PathBuf>, codec: Codec) -> Self {
        Self { base: base.into(), codec, locks: parking_lot::Mutex::new(HashMap::new()) }
    }

    fn lock_for(&self, url: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        locks.entry(url.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    fn path_for(&self, url: &str, host_port: &str) -> PathBuf {
        self.base.join("monitor").join(sanitize(host_port)).join(format!("{}_history.parquet", url_hash16(url)))
    }

    /// Atomically dedupe-then-append `record` for `record.url`.
    ///
    /// Acquires the URL-scoped mutex, reads all existing records, skips the
    /// write if a record with the same `(content_hash, timestamp_ms)`
    /// already exists, otherwise rewrites the file with `existing ++ [new]`.
    /// The read-modify-write itself runs inside `spawn_blocking` (SPEC_FULL.md
    /// §2 C2) so the parquet file I/O never blocks the async executor thread.
    pub async fn store(&self, host_port: &str, record: FileHistoryRecord) -> Result<(), StorageError> {
        let guard_lock = self.lock_for(&record.url);
        let _guard = guard_lock.lock().await;

        let path = self.path_for(&record.url, host_port);
        let codec = self.codec;
        tokio::task::spawn_blocking(move || {
            let mut existing = read_all_blocking(&path)?;
            if existing.iter().any(|r| r.is_duplicate_of(&record)) {
                return Ok(());
            }
            existing.push(record);
            write_all_blocking(&path, &existing, codec)
        })
        .await?
    }

    /// The most recent record for `url`, if any.
    pub async fn latest(&self, url: &str, host_port: &str) -> Result<Option<FileHistoryRecord>, StorageError> {
        Ok(self.recent(url, host_port, 1).await?.into_iter().next())
    }

    /// The `limit` most recent records, newest first (stable order on ties).
    pub async fn recent(
        &self,
        url: &str,
        host_port: &str,
        limit: usize,
    ) -> Result<Vec<FileHistoryRecord>, StorageError> {
        let path = self.path_for(url, host_port);
        let mut records = tokio::task::spawn_blocking(move || read_all_blocking(&path)).await??;
        sort_desc_stable(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    pub async fn latest_hash(&self, url: &str, host_port: &str) -> Result<Option<String>, StorageError> {
        Ok(self.latest(url, host_port).await?.map(|r| r.content_hash))
    }

    /// Latest stored `ContentDiff` for each of `urls`, grouped by host:port
    /// to batch file reads per host (spec §4.2 `AllLatestDiffs`).
    pub async fn all_latest_diffs(
        &self,
        urls: &[(String, String)],
    ) -> Result<HashMap<String, Option<recon_core::ContentDiff>>, StorageError> {
        let mut by_host: HashMap<&str, Vec<&str>> = HashMap::new();
        for (url, host_port) in urls {
            by_host.entry(host_port.as_str()).or_default().push(url.as_str());
        }

        let mut out = HashMap::new();
        for (host_port, urls) in by_host {
            for url in urls {
                let latest = self.latest(url, host_port).await?;
                let diff = latest.and_then(|r| r.diff_json.and_then(|j| serde_json::from_str(&j).ok()));
                out.insert(url.to_string(), diff);
            }
        }
        Ok(out)
    }

    /// Visit every record across the whole history tree, newest-first within
    /// each file, skipping files whose name contains `"archived"` (spec
    /// §4.2). Streams one file at a time to bound memory ("stream, don't
    /// slurp", spec §9).
    pub fn for_each_record(&self, mut f: impl FnMut(&str, &FileHistoryRecord)) -> Result<(), StorageError> {
        for host_dir in self.host_dirs()? {
            let host_port = crate::sanitize::restore_host_port(
                host_dir.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
            );
            for entry in std::fs::read_dir(&host_dir).map_err(|e| StorageError::io(&host_dir, e))? {
                let entry = entry.map_err(|e| StorageError::io(&host_dir, e))?;
                let path = entry.path();
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                if name.contains("archived") {
                    continue;
                }
                let mut records = read_all_blocking(&path)?;
                sort_desc_stable(&mut records);
                for r in &records {
                    f(&host_port, r);
                }
            }
        }
        Ok(())
    }

    /// All host:port directories with at least one history file.
    pub fn hosts_with_history(&self) -> Result<Vec<String>, StorageError> {
        self.host_dirs()?
            .into_iter()
            .map(|d| {
                Ok(crate::sanitize::restore_host_port(
                    d.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
                ))
            })
            .collect()
    }

    fn host_dirs(&self) -> Result<Vec<PathBuf>, StorageError> {
        let monitor_dir = self.base.join("monitor");
        if !monitor_dir.exists() {
            return Ok(Vec::new());
        }
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&monitor_dir).map_err(|e| StorageError::io(&monitor_dir, e))? {
            let entry = entry.map_err(|e| StorageError::io(&monitor_dir, e))?;
            if entry.path().is_dir() {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }

}

fn read_all_blocking(path: &Path) -> Result<Vec<FileHistoryRecord>, StorageError> {
    let rows = read_rows(path)?;
    Ok(rows.iter().filter_map(row_to_record).collect())
}

fn write_all_blocking(path: &Path, records: &[FileHistoryRecord], codec: Codec) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let rows: Vec<HistoryRow> = records.iter().map(HistoryRow::from).collect();
    write_rows(path, &rows, codec)
}

/// Sort records by `timestamp_ms` descending with a stable tie-break on
/// `content_hash` so repeated reads are deterministic (spec §4.2 "read-sort
/// contract").
fn sort_desc_stable(records: &mut [FileHistoryRecord]) {
    records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms).then_with(|| a.content_hash.cmp(&b.content_hash)));
}
