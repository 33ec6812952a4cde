//! CLI command implementations.

pub mod categories;
pub mod config;
pub mod process;
pub mod reconcile;

use std::path::{Path, PathBuf};

use passbook_core::models::PassbookConfig;

/// Config file location: `--config` if given, else the platform config dir.
pub fn config_path(config_path: Option<&str>) -> PathBuf {
    match config_path {
        Some(path) => PathBuf::from(path),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("passbook")
            .join("config.json"),
    }
}

/// Load the config file, or defaults when it does not exist yet.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PassbookConfig> {
    let path = self::config_path(config_path);
    if path.exists() {
        Ok(PassbookConfig::from_file(&path)?)
    } else if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display())
    } else {
        Ok(PassbookConfig::default())
    }
}

/// Directory holding custom categories and overrides.
pub fn data_dir(config: &PassbookConfig, override_dir: Option<&Path>) -> PathBuf {
    override_dir
        .map(Path::to_path_buf)
        .or_else(|| config.storage.data_dir.clone())
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("passbook")
        })
}
