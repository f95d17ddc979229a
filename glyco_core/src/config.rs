//! Configuration file support for Glyco.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/glyco/config.toml`.

use crate::document::DocumentOptions;
use crate::service::ImportMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub owner: OwnerConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub document: DocumentConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Path of the reading store inside a data directory
    pub fn store_path(data_dir: &Path) -> PathBuf {
        data_dir.join("readings.jsonl")
    }
}

/// Identity used when the caller does not supply one
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct OwnerConfig {
    #[serde(default)]
    pub default_user: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub mode: ImportMode,
}

/// Paginated document rendering
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,

    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            rows_per_page: default_rows_per_page(),
            title: default_title(),
        }
    }
}

impl DocumentConfig {
    pub fn options(&self) -> DocumentOptions {
        DocumentOptions {
            title: self.title.clone(),
            rows_per_page: self.rows_per_page,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("glyco")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_rows_per_page() -> usize {
    DocumentOptions::default().rows_per_page
}

fn default_title() -> String {
    DocumentOptions::default().title
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.document.rows_per_page == 0 {
            return Err(Error::Config("document.rows_per_page must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("glyco").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
