// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup from `LogConfig` (spec §6, §9): stdout or rotating file,
//! json or pretty formatting, env-filter honoring `RUST_LOG` over the
//! configured level.

use recon_core::config::LogConfig;
use recon_core::RecoError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Rotate `path` if it has grown past `max_size_mb`, keeping up to
/// `max_backups` numbered generations (`daemon.log.1`, `.2`, ...).
/// Best-effort: failures are ignored so the daemon still starts.
fn rotate_log_if_needed(path: &std::path::Path, max_size_mb: u64, max_backups: u32) {
    let size = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < max_size_mb.saturating_mul(1024 * 1024) {
        return;
    }
    let path_str = path.display().to_string();
    for i in (1..max_backups).rev() {
        let from = format!("{path_str}.{i}");
        let to = format!("{path_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(path, format!("{path_str}.1"));
}

/// Initialize the global `tracing` subscriber per `config`. Returns the
/// `WorkerGuard` for a file sink; the caller must hold it for the process
/// lifetime or buffered lines are lost on exit.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, RecoError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let json = config.format.eq_ignore_ascii_case("json");

    match &config.file {
        Some(file) => {
            let path = std::path::Path::new(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RecoError::wrap("creating log directory", e))?;
            }
            rotate_log_if_needed(path, config.max_size_mb, config.max_backups);

            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let filename = path.file_name().ok_or_else(|| RecoError::InvalidInput("log_config.file has no filename".to_string()))?;
            let appender = tracing_appender::rolling::never(dir, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            if json {
                tracing_subscriber::registry().with(filter).with(fmt::layer().json().with_writer(non_blocking)).init();
            } else {
                tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
            }
            Ok(Some(guard))
        }
        None => {
            if json {
                tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
            } else {
                tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_is_a_noop_below_the_size_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.log");
        std::fs::write(&path, b"small").unwrap();
        rotate_log_if_needed(&path, 50, 5);
        assert!(path.exists());
        assert!(!dir.path().join("daemon.log.1").exists());
    }

    #[test]
    fn rotate_shifts_generations_past_the_size_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.log");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        rotate_log_if_needed(&path, 0, 3);
        assert!(!path.exists());
        assert!(dir.path().join("daemon.log.1").exists());
    }
}
