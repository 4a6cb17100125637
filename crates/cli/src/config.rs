//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use unidash_core::UnidashConfig;

/// Load configuration from `path`, or from the default locations
pub fn load_config(path: Option<&Path>) -> Result<UnidashConfig> {
    match path {
        Some(path) => UnidashConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => UnidashConfig::load().context("failed to load config"),
    }
}

/// Data directory: the flag, then `UNIDASH_STATE_DIR`, then the platform default
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        std::env::var_os("UNIDASH_STATE_DIR").map_or_else(
            || {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("unidash")
            },
            PathBuf::from,
        )
    })
}
