//! CLI subcommands.

pub mod config;
pub mod parse;
pub mod sync;

use std::path::{Path, PathBuf};

use ordersync_core::SyncConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ordersync")
        .join("config.json")
}

/// Configuration file in effect: the `--config` path if given, else the
/// default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. An explicit path must exist; a missing default
/// file falls back to built-in defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<SyncConfig> {
    if let Some(path) = explicit {
        return SyncConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let path = default_config_path();
    if path.exists() {
        Ok(SyncConfig::from_file(&path)?)
    } else {
        Ok(SyncConfig::default())
    }
}
