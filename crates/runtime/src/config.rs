//! Registry configuration structures and loaders.
use std::env;
use std::path::PathBuf;

/// Store name used when nothing else is configured.
pub const DEFAULT_STORE_NAME: &str = "holograms";

/// Where the registry keeps its persisted holograms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Directory holding file-backed stores.
    pub data_dir: PathBuf,
    /// Name of the store opened through the storage provider.
    pub store_name: String,
}

impl RegistryConfig {
    pub fn new(data_dir: impl Into<PathBuf>, store_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            store_name: store_name.into(),
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `HOLOGRAMS_DATA_DIR` - Directory for store files (default: platform data dir)
    /// - `HOLOGRAMS_STORE` - Store name (default: `holograms`)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os("HOLOGRAMS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(name) = env::var("HOLOGRAMS_STORE")
            && !name.trim().is_empty()
        {
            config.store_name = name.trim().to_string();
        }

        config
    }

    /// Path of the file-backed store described by this config.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.store_name))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}

/// Platform data directory for hologram stores.
///
/// - macOS: `~/Library/Application Support/holograms`
/// - Linux: `~/.local/share/holograms` (or `$XDG_DATA_HOME/holograms`)
/// - Windows: `%APPDATA%\holograms`
/// - Fallback: `./data`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "holograms")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}
