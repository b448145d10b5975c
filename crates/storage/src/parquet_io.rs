// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin helpers over the `parquet`/`parquet_derive` crates: write a slice of
//! a `#[derive(ParquetRecordWriter)]` row type to a file, and read rows back
//! as generic `parquet::record::Row`s for column-by-name extraction.
//!
//! Kept generic so the History Store, Probe-Result Store, and Secrets Store
//! all share one (de)serialization path rather than three hand-rolled ones.

use crate::codec::Codec;
use crate::error::StorageError;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::{Field, Row, RecordWriter};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Write `rows` to `path`, fully replacing any existing file content at that
/// path (callers needing atomic replace go through a temp-file rename
/// themselves; see `snapshot.rs`).
pub fn write_rows<T>(path: &Path, rows: &[T], codec: Codec) -> Result<(), StorageError>
where
    for<'a> &'a [T]: RecordWriter<T>,
{
    let schema = rows.schema().map_err(|e| StorageError::parquet(path, e))?;
    let props = Arc::new(WriterProperties::builder().set_compression(codec.to_parquet_compression()).build());
    let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
    let mut writer =
        SerializedFileWriter::new(file, schema, props).map_err(|e| StorageError::parquet(path, e))?;
    let mut row_group = writer.next_row_group().map_err(|e| StorageError::parquet(path, e))?;
    rows.write_to_row_group(&mut row_group).map_err(|e| StorageError::parquet(path, e))?;
    row_group.close().map_err(|e| StorageError::parquet(path, e))?;
    writer.close().map_err(|e| StorageError::parquet(path, e))?;
    Ok(())
}

/// Read every row from `path`. A missing file yields an empty vector (spec
/// §4.2: "a missing file is not an error").
pub fn read_rows(path: &Path) -> Result<Vec<Row>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let reader = SerializedFileReader::new(file).map_err(|e| StorageError::parquet(path, e))?;
    let mut out = Vec::new();
    for row in reader.get_row_iter(None).map_err(|e| StorageError::parquet(path, e))? {
        out.push(row.map_err(|e| StorageError::parquet(path, e))?);
    }
    Ok(out)
}

/// Column accessors by name, tolerant of nullable columns stored as
/// `Option<T>` on the writer side (they decode as `Field::Null` when absent).
pub fn field_str(row: &Row, name: &str) -> Option<String> {
    row.get_column_iter().find(|(n, _)| n.as_str() == name).and_then(|(_, f)| match f {
        Field::Str(s) => Some(s.clone()),
        _ => None,
    })
}

pub fn field_i64(row: &Row, name: &str) -> Option<i64> {
    row.get_column_iter().find(|(n, _)| n.as_str() == name).and_then(|(_, f)| match f {
        Field::Long(v) => Some(*v),
        Field::Int(v) => Some(*v as i64),
        _ => None,
    })
}

pub fn field_bool(row: &Row, name: &str) -> Option<bool> {
    row.get_column_iter().find(|(n, _)| n.as_str() == name).and_then(|(_, f)| match f {
        Field::Bool(v) => Some(*v),
        _ => None,
    })
}

pub fn field_bytes(row: &Row, name: &str) -> Option<Vec<u8>> {
    row.get_column_iter().find(|(n, _)| n.as_str() == name).and_then(|(_, f)| match f {
        Field::Bytes(b) => Some(b.data().to_vec()),
        _ => None,
    })
}
