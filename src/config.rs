//! Store configuration.

use crate::backend::FileBackend;
use crate::error::Result;
use crate::store::SubscriptionStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Canonical storage key for the persisted collection.
pub const STORAGE_KEY: &str = "subplanner_subscriptions";

/// Key used by an older schema without `order`/`isActive`. Never read or
/// written; only checked for so its presence can be reported.
pub const LEGACY_STORAGE_KEY: &str = "subscriptions";

/// Store configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory for the file backend.
    pub data_dir: PathBuf,

    /// Key the collection is persisted under.
    pub storage_key: String,

    /// Per-listener event buffer before a slow listener is dropped.
    pub event_buffer_size: usize,

    /// Bundled template catalog, refreshed by `subplanner-sync`.
    pub templates_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            storage_key: STORAGE_KEY.to_string(),
            event_buffer_size: 1000,
            templates_path: PathBuf::from("./public/templates.csv"),
        }
    }
}

impl StoreConfig {
    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded store configuration");
        Ok(config)
    }

    /// Open a file-backed store in `data_dir`.
    pub fn open_file_store(&self) -> Result<SubscriptionStore<FileBackend>> {
        let backend = FileBackend::new(&self.data_dir)?;
        SubscriptionStore::with_config(backend, self)
    }
}
