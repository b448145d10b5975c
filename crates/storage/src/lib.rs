// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! recon-storage: Parquet-backed persistence for the reconnaissance engine.
//!
//! Three independent stores share a filesystem root (`--globalconfig`'s
//! `storage_path`) and a `parquet_io` helper layer:
//!
//! - [`history::HistoryStore`] — per-URL monitored-file history (C2)
//! - [`snapshot::ProbeResultStore`] — per-target latest scan snapshot (C3)
//! - [`secrets::SecretsStore`] — deduplicated secret findings (C6 sink)

pub mod codec;
pub mod error;
pub mod history;
pub mod parquet_io;
pub mod sanitize;
pub mod secrets;
pub mod snapshot;

pub use codec::Codec;
pub use error::StorageError;
pub use history::HistoryStore;
pub use secrets::SecretsStore;
pub use snapshot::ProbeResultStore;
