// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the History Store, Probe-Result Store, and Secrets Store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error at {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("unknown compression codec {0:?}, falling back to uncompressed")]
    UnknownCodec(String),

    #[error("blocking I/O task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }

    pub fn parquet(path: impl Into<PathBuf>, source: parquet::errors::ParquetError) -> Self {
        StorageError::Parquet { path: path.into(), source }
    }
}
