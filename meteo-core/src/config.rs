use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    Coordinates,
    client::openmeteo::DEFAULT_BASE_URL,
    location::{LocationRequest, LocationSourceKind, Priority, ip::DEFAULT_LOOKUP_URL},
};

/// Forecast endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string() }
    }
}

/// How device location is obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub source: LocationSourceKind,
    pub priority: Priority,
    pub interval_secs: u64,
    pub fastest_interval_secs: u64,
    pub ip_lookup_url: String,

    /// Example TOML:
    /// home = { latitude = 45.81, longitude = 15.98 }
    pub home: Option<Coordinates>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: LocationSourceKind::default(),
            priority: Priority::default(),
            interval_secs: 60,
            fastest_interval_secs: 5,
            ip_lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            home: None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub location: LocationConfig,
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Store a home position and switch the location source to it.
    pub fn set_home(&mut self, home: Coordinates) {
        self.location.home = Some(home);
        self.location.source = LocationSourceKind::Fixed;
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            priority: self.location.priority,
            interval: Duration::from_secs(self.location.interval_secs.max(1)),
            fastest_interval: Duration::from_secs(self.location.fastest_interval_secs.max(1)),
        }
    }
}
