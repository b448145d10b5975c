// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets Store backing the Secret Detector (spec §4.6, component C6):
//! a single columnar file of redacted findings at `<base>/secrets.parquet`,
//! deduplicated on `(source_url, secret_text, rule_id)`.

use crate::codec::Codec;
use crate::error::StorageError;
use crate::parquet_io::{field_i64, field_str, read_rows, write_rows};
use parquet_derive::ParquetRecordWriter;
use recon_core::SecretFinding;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(ParquetRecordWriter)]
struct FindingRow {
    rule_id: String,
    description: String,
    source_url: String,
    secret_text: String,
    line_number: i64,
    found_at_ms: i64,
}

impl From<&SecretFinding> for FindingRow {
    fn from(f: &SecretFinding) -> Self {
        FindingRow {
            rule_id: f.rule_id.clone(),
            description: f.description.clone(),
            source_url: f.source_url.clone(),
            secret_text: f.secret_text.clone(),
            line_number: f.line_number as i64,
            found_at_ms: f.found_at_ms as i64,
        }
    }
}

fn row_to_finding(row: &parquet::record::Row) -> Option<SecretFinding> {
    Some(SecretFinding {
        rule_id: field_str(row, "rule_id")?,
        description: field_str(row, "description")?,
        source_url: field_str(row, "source_url")?,
        secret_text: field_str(row, "secret_text")?,
        line_number: field_i64(row, "line_number")? as usize,
        found_at_ms: field_i64(row, "found_at_ms")? as u64,
    })
}

/// Append-only, dedup-on-write store for secret findings.
pub struct SecretsStore {
    path: PathBuf,
    codec: Codec,
    write_lock: tokio::sync::Mutex<()>,
}

impl SecretsStore {
    pub fn new(base: impl Into<PathBuf>, codec: Codec) -> Self {
        Self { path: base.into().join("secrets.parquet"), codec, write_lock: tokio::sync::Mutex::new(()) }
    }

    /// Append `findings` not already present under the `(source_url,
    /// secret_text, rule_id)` key, returning how many were newly recorded.
    pub async fn append(&self, findings: &[SecretFinding]) -> Result<usize, StorageError> {
        if findings.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;

        let mut existing = self.read_all()?;
        let seen: HashSet<(String, String, String)> = existing
            .iter()
            .map(|f| (f.source_url.clone(), f.secret_text.clone(), f.rule_id.clone()))
            .collect();

        let mut added = 0;
        for f in findings {
            let key = (f.source_url.clone(), f.secret_text.clone(), f.rule_id.clone());
            if seen.contains(&key) {
                continue;
            }
            existing.push(f.clone());
            added += 1;
        }

        if added > 0 {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
            let rows: Vec<FindingRow> = existing.iter().map(FindingRow::from).collect();
            write_rows(&self.path, &rows, self.codec)?;
        }
        Ok(added)
    }

    pub fn all(&self) -> Result<Vec<SecretFinding>, StorageError> {
        self.read_all()
    }

    fn read_all(&self) -> Result<Vec<SecretFinding>, StorageError> {
        let rows = read_rows(&self.path)?;
        Ok(rows.iter().filter_map(row_to_finding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn finding(rule: &str, url: &str, text: &str) -> SecretFinding {
        SecretFinding {
            rule_id: rule.to_string(),
            description: "test rule".to_string(),
            source_url: url.to_string(),
            secret_text: text.to_string(),
            line_number: 1,
            found_at_ms: 0,
        }
    }

    #[tokio::test]
    async fn append_then_all_round_trips() {
        let dir = tempdir().unwrap();
        let store = SecretsStore::new(dir.path(), Codec::Uncompressed);
        let added = store.append(&[finding("aws-key", "https://a.test", "AKIA****ABCD")]).await.unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_key_is_not_appended_twice() {
        let dir = tempdir().unwrap();
        let store = SecretsStore::new(dir.path(), Codec::Uncompressed);
        store.append(&[finding("aws-key", "https://a.test", "AKIA****ABCD")]).await.unwrap();
        let added = store.append(&[finding("aws-key", "https://a.test", "AKIA****ABCD")]).await.unwrap();
        assert_eq!(added, 0);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn distinct_rule_id_for_same_text_is_recorded_separately() {
        let dir = tempdir().unwrap();
        let store = SecretsStore::new(dir.path(), Codec::Uncompressed);
        store.append(&[finding("aws-key", "https://a.test", "AKIA****ABCD")]).await.unwrap();
        let added = store.append(&[finding("generic-token", "https://a.test", "AKIA****ABCD")]).await.unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.all().unwrap().len(), 2);
    }
}
