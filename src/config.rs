//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use crate::constants::{APP_NAME, DEFAULT_DEVICE_ID};
use crate::models::Orientation;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "LAZYESP_CONFIG_DIR";

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathConfig {
    /// Directory scanned for hardware recipe templates
    pub hardware_dir: Option<PathBuf>,
}

/// Defaults applied when a project or command line leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Device used by projects without a `device_model`
    pub default_device: String,
    /// Orientation used by `compile` when none is requested
    pub default_orientation: Orientation,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            default_device: DEFAULT_DEVICE_ID.to_string(),
            default_orientation: Orientation::default(),
        }
    }
}

/// Template fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP timeout for template fetches, in seconds
    pub fetch_timeout_secs: u64,
    /// Prefix for relative template locations not found on disk
    pub template_base_url: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 20,
            template_base_url: None,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/LazyESP/config.toml`
/// - macOS: `~/Library/Application Support/LazyESP/config.toml`
/// - Windows: `%APPDATA%\LazyESP\config.toml`
///
/// `LAZYESP_CONFIG_DIR` overrides the directory.
///
/// # Validation
///
/// - `hardware_dir` must be a directory when set
/// - `fetch_timeout_secs` must be positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// File system paths
    pub paths: PathConfig,
    /// Compile defaults
    pub compile: CompileConfig,
    /// Template fetch settings
    pub network: NetworkConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit path (temp file + rename).
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.paths.hardware_dir {
            if !dir.is_dir() {
                anyhow::bail!("Hardware directory does not exist: {}", dir.display());
            }
        }

        if self.network.fetch_timeout_secs == 0 {
            anyhow::bail!("Fetch timeout must be at least one second");
        }

        if self.compile.default_device.trim().is_empty() {
            anyhow::bail!("Default device must not be empty");
        }

        Ok(())
    }

    /// Sets the hardware directory with validation.
    pub fn set_hardware_dir(&mut self, path: PathBuf) -> Result<()> {
        self.paths.hardware_dir = Some(path);
        self.validate()
    }
}
