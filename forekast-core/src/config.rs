use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::api::{DEFAULT_BASE_URL, MAX_FORECAST_DAYS};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "FOREKAST_API_KEY";

const DEFAULT_FORECAST_DAYS: u8 = 3;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// forecast_days = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the weather service root, e.g. a local mock.
    pub base_url: Option<String>,

    pub forecast_days: u8,

    /// Where the location list lives; defaults to the platform data dir.
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            forecast_days: DEFAULT_FORECAST_DAYS,
            data_file: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "forekast", "forekast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Settings file holding the location list.
    pub fn data_file_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("settings.json")),
        }
    }

    /// API key from the environment, else from the file. Blank keys count as unset.
    pub fn effective_api_key(&self) -> Option<String> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::pick_api_key(env_key, self.api_key.as_deref())
    }

    fn pick_api_key(env_key: Option<String>, file_key: Option<&str>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| file_key.filter(|k| !k.trim().is_empty()).map(str::to_owned))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().filter(|u| !u.is_empty()).unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn forecast_days(&self) -> u8 {
        self.forecast_days.clamp(1, MAX_FORECAST_DAYS)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn is_configured(&self) -> bool {
        self.effective_api_key().is_some()
    }
}
