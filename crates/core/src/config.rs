// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global configuration shape and validation (spec §6, §4.12 component C12).
//!
//! Parsing YAML/JSON off disk is an I/O concern and lives in the `recon`
//! binary crate; this module only defines the shape and the validation
//! rules every loader must apply before handing a `Config` to the engine.

use crate::error::{RecoError, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub parquet_base_path: String,
    pub compression_codec: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { parquet_base_path: "./data".to_string(), compression_codec: "zstd".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimiterConfig {
    pub max_memory_mb: u64,
    pub max_goroutines: u64,
    pub check_interval_secs: u64,
    pub memory_threshold: f64,
    pub goroutine_warning: u64,
    pub system_mem_threshold: f64,
    pub cpu_threshold: f64,
    pub enable_auto_shutdown: bool,
}

impl Default for ResourceLimiterConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 1024,
            max_goroutines: 10_000,
            check_interval_secs: 15,
            memory_threshold: 0.8,
            goroutine_warning: 5_000,
            system_mem_threshold: 0.9,
            cpu_threshold: 0.9,
            enable_auto_shutdown: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub scan_webhook_url: Option<String>,
    pub monitor_webhook_url: Option<String>,
    pub mention_role_ids: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { scan_webhook_url: None, monitor_webhook_url: None, mention_role_ids: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: usize,
    pub max_content_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { enabled: false, interval_secs: 300, batch_size: 25, max_content_size: 10 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub enabled: bool,
    pub notify_on_found: bool,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self { enabled: true, notify_on_found: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
    pub max_size_mb: u64,
    pub max_backups: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file: None,
            max_size_mb: 50,
            max_backups: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_secs: u64,
    pub crawl_max_urls: usize,
    pub probe_concurrency: usize,
    /// Overrides the primary root target (spec §4.8 step 6: "the first seed
    /// URL, or configured override") used to key the Probe-Result Store and
    /// URL Differ. Useful when the seed list's first entry isn't the target
    /// operators want history keyed on (e.g. a load-balanced mirror listed
    /// first for crawl coverage).
    pub root_target_override: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { interval_secs: 3600, crawl_max_urls: 500, probe_concurrency: 20, root_target_override: None }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_config: StorageConfig,
    pub resource_limiter_config: ResourceLimiterConfig,
    pub notification_config: NotificationConfig,
    pub monitor_config: MonitorConfig,
    pub secrets_config: SecretsConfig,
    pub log_config: LogConfig,
    pub scan_config: ScanConfig,
}

impl Config {
    /// Config integrity checks (spec §4.12, §7: "fatal at startup").
    pub fn validate(&self) -> Result<(), RecoError> {
        if self.storage_config.parquet_base_path.trim().is_empty() {
            return Err(field_error("storage_config.parquet_base_path", "", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.resource_limiter_config.memory_threshold) {
            return Err(field_error(
                "resource_limiter_config.memory_threshold",
                self.resource_limiter_config.memory_threshold,
                "must be between 0.0 and 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.resource_limiter_config.system_mem_threshold) {
            return Err(field_error(
                "resource_limiter_config.system_mem_threshold",
                self.resource_limiter_config.system_mem_threshold,
                "must be between 0.0 and 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.resource_limiter_config.cpu_threshold) {
            return Err(field_error(
                "resource_limiter_config.cpu_threshold",
                self.resource_limiter_config.cpu_threshold,
                "must be between 0.0 and 1.0",
            ));
        }
        if self.monitor_config.enabled && self.monitor_config.batch_size == 0 {
            return Err(field_error("monitor_config.batch_size", 0, "must be greater than 0 when monitoring is enabled"));
        }
        if self.monitor_config.enabled && self.monitor_config.max_content_size == 0 {
            return Err(field_error(
                "monitor_config.max_content_size",
                0,
                "must be greater than 0 when monitoring is enabled",
            ));
        }
        if self.scan_config.probe_concurrency == 0 {
            return Err(field_error("scan_config.probe_concurrency", 0, "must be greater than 0"));
        }
        Ok(())
    }
}

fn field_error(field: &str, value: impl std::fmt::Display, message: &str) -> RecoError {
    RecoError::InvalidConfiguration(ValidationError {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("default config must validate");
    }

    #[test]
    fn empty_base_path_is_rejected() {
        let mut cfg = Config::default();
        cfg.storage_config.parquet_base_path = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut cfg = Config::default();
        cfg.resource_limiter_config.memory_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_batch_size_rejected_only_when_monitoring_enabled() {
        let mut cfg = Config::default();
        cfg.monitor_config.batch_size = 0;
        assert!(cfg.validate().is_ok());
        cfg.monitor_config.enabled = true;
        assert!(cfg.validate().is_err());
    }
}
