//! Application configuration
//!
//! Read from `{config_dir}/recall/config.toml`. Every field is optional in
//! the file; missing fields and a missing file fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::SessionLimits;

const APP_DIR: &str = "recall";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine the {0} directory")]
    DirNotFound(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the collection is stored
    pub data_dir: PathBuf,
    /// File name of the collection inside `data_dir`
    pub collection_file: String,
    pub new_cards_per_day: u32,
    pub reviews_per_day: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            data_dir: default_data_dir().unwrap_or_else(|_| PathBuf::from(APP_DIR)),
            collection_file: "collection.json".to_string(),
            new_cards_per_day: limits.new_cards_per_day,
            reviews_per_day: limits.reviews_per_day,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        log::info!("Wrote config to {:?}", path);
        Ok(())
    }

    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(&self.collection_file)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            new_cards_per_day: self.new_cards_per_day,
            reviews_per_day: self.reviews_per_day,
        }
    }
}

/// `{data_local_dir}/recall`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join(APP_DIR))
        .ok_or(ConfigError::DirNotFound("data"))
}

/// `{config_dir}/recall/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::DirNotFound("config"))
}
