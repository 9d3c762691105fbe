use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{provider::clamp_day_count, units::TemperatureUnit};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_PRO_BASE_URL: &str = "https://pro.openweathermap.org";
pub const DEFAULT_CITY: &str = "rabat";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "rabat"
/// unit = "celsius"
/// day_count = 16
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// City shown when no search or map pick is active.
    pub default_city: String,

    pub unit: TemperatureUnit,

    /// Days requested from the daily endpoint, clamped to 1..=16.
    pub day_count: u8,

    pub api_base_url: String,

    /// Host serving the hourly and daily endpoints.
    pub pro_base_url: String,

    /// Overrides the platform data dir location of the favorites file.
    pub favorites_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            unit: TemperatureUnit::default(),
            day_count: 16,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            pro_base_url: DEFAULT_PRO_BASE_URL.to_string(),
            favorites_path: None,
        }
    }
}

impl Config {
    /// Returns the API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn day_count(&self) -> u8 {
        clamp_day_count(Some(self.day_count))
    }

    /// Load config from disk (or defaults on first run), then apply the
    /// `OPENWEATHER_API_KEY` override.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!("Using API key from {API_KEY_ENV}");
                cfg.set_api_key(key);
            }
        }

        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No weatherdash config yet, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(anyhow!("Cannot read weatherdash config {}: {e}", path.display()));
            }
        };

        toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Invalid weatherdash config {}: {}\n\
                 Hint: fix the file by hand or run `weatherdash configure` to rewrite it.",
                path.display(),
                e.message()
            )
        })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Blank API keys are dropped before writing.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut cfg = self.clone();
        cfg.api_key = self.api_key().map(str::to_string);

        let toml = toml::to_string_pretty(&cfg).context("Cannot encode weatherdash config as TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Cannot create weatherdash config directory {}", parent.display())
            })?;
        }
        fs::write(path, toml)
            .with_context(|| format!("Cannot write weatherdash config {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Saved weatherdash config");
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the favorites file, honoring `favorites_path`.
    pub fn favorites_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.favorites_path {
            return Ok(path.clone());
        }

        Ok(Self::project_dirs()?.data_dir().join("favorites.json"))
    }
}
