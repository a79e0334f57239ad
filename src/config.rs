//! Configuration management for the Savor gateway

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default backend base URL
const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Default interaction language
const DEFAULT_LANG: &str = "en";

/// Savor gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote ordering service
    pub backend: BackendConfig,

    /// Voice interaction settings
    pub voice: VoiceConfig,

    /// Path to data directory (location cache)
    pub data_dir: PathBuf,
}

/// Remote ordering service configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the search/places/order/TTS service
    pub base_url: String,
}

/// Voice interaction configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Interaction language ("en", "pl"); selects the keyword table and the
    /// TTS language
    pub lang: String,
}

/// Optional TOML overlay, all fields optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    backend_url: Option<String>,
    lang: Option<String>,
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration: defaults, then an optional TOML file, then
    /// environment variables (`SAVOR_BACKEND_URL`, `SAVOR_LANG`,
    /// `SAVOR_DATA_DIR`)
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if no data directory can be determined
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => ConfigFile::default(),
        };

        let backend_url = std::env::var("SAVOR_BACKEND_URL")
            .ok()
            .or(file.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let lang = std::env::var("SAVOR_LANG")
            .ok()
            .or(file.lang)
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        let data_dir = std::env::var("SAVOR_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.data_dir)
            .or_else(default_data_dir)
            .ok_or_else(|| Error::Config("cannot determine data directory".to_string()))?;

        Ok(Self {
            backend: BackendConfig { base_url: backend_url },
            voice: VoiceConfig { lang },
            data_dir,
        })
    }
}

/// Platform data directory for the gateway
fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "savor").map(|d| d.data_dir().to_path_buf())
}
