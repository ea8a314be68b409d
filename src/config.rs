//! Configuration management for Shelfsync.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::store::LibraryStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "Shelfsync";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source and output locations.
    pub paths: PathsConfig,

    /// Cache and index artifact settings.
    pub store: StoreConfig,

    /// Scan behavior.
    pub scan: ScanConfig,
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one subdirectory per novel.
    pub source_directory: PathBuf,

    /// Directory where the cache and index are written.
    pub output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("source"),
            output_directory: PathBuf::from("dist"),
        }
    }
}

/// Cache and index artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File name of the full cache.
    pub cache_filename: String,

    /// File name of the metadata-only index.
    pub index_filename: String,

    /// Characters of each chapter body kept in the cache.
    pub chapter_preview_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_filename: LibraryStore::CACHE_FILENAME.to_string(),
            index_filename: LibraryStore::INDEX_FILENAME.to_string(),
            chapter_preview_chars: LibraryStore::PREVIEW_CHARS,
        }
    }
}

/// Scan behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Build novels on blocking worker threads, one per folder.
    pub parallel: bool,

    /// Ignore the previous cache so every novel is classified as new.
    pub force_rebuild: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            force_rebuild: false,
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.chapter_preview_chars == 0 {
            return Err(invalid("store.chapter_preview_chars", "must be greater than 0"));
        }

        if self.store.cache_filename.trim().is_empty() {
            return Err(invalid("store.cache_filename", "must not be empty"));
        }

        if self.store.index_filename.trim().is_empty() {
            return Err(invalid("store.index_filename", "must not be empty"));
        }

        if self.store.cache_filename == self.store.index_filename {
            return Err(invalid(
                "store.index_filename",
                "must differ from store.cache_filename",
            ));
        }

        Ok(())
    }

    /// Builds the artifact store described by this configuration.
    pub fn library_store(&self) -> LibraryStore {
        LibraryStore::from_config(&self.paths.output_directory, &self.store)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
