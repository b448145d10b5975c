// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads `Config` off disk (YAML or JSON, by extension) and runs C12
//! validation before any pipeline is constructed (spec §4.12, §7).

use anyhow::{bail, Context, Result};
use recon_core::Config;
use std::path::Path;

/// Load and validate the config at `path`. Falls back to YAML parsing for
/// any extension other than `.json`, matching the teacher's convention of
/// treating YAML as the default config format.
pub fn load(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).with_context(|| format!("parsing {} as JSON", path.display()))?,
        _ => serde_yaml::from_str(&contents).with_context(|| format!("parsing {} as YAML", path.display()))?,
    };

    if let Err(e) = config.validate() {
        bail!("invalid config {}: {e}", path.display());
    }
    Ok(config)
}
