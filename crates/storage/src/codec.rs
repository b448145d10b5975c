// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compression codec selection for Parquet-backed stores (spec §4.2/§6).

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};

/// Configured compression codec. Unknown config values fall back to
/// `Uncompressed` with a warning logged by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Snappy,
    Gzip,
    #[default]
    Zstd,
    Uncompressed,
}

impl Codec {
    /// Parse a config string, falling back to `Uncompressed` for anything
    /// unrecognized (spec §6: "unknown values fall back to uncompressed
    /// with a warning").
    pub fn from_config_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Codec::Snappy,
            "gzip" => Codec::Gzip,
            "zstd" => Codec::Zstd,
            "uncompressed" | "none" => Codec::Uncompressed,
            _ => Codec::Uncompressed,
        }
    }

    pub fn is_recognized(s: &str) -> bool {
        matches!(s.to_ascii_lowercase().as_str(), "snappy" | "gzip" | "zstd" | "uncompressed" | "none")
    }

    pub fn to_parquet_compression(self) -> Compression {
        match self {
            Codec::Snappy => Compression::SNAPPY,
            Codec::Gzip => Compression::GZIP(GzipLevel::default()),
            Codec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Codec::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}
