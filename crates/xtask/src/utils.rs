//! Utility functions for xtask commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hologram_runtime::RegistryConfig;

/// Resolve the store file: explicit path, or the one configured by the environment.
pub fn store_file(file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(|| RegistryConfig::from_env().store_path())
}

/// Split a store file into the registry config that opens it.
pub fn config_for(file: &Path) -> Result<RegistryConfig> {
    let store_name = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Store file has no usable name: {}", file.display()))?;
    let data_dir = file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    Ok(RegistryConfig::new(data_dir, store_name))
}
