//! Hardware template loading.
//!
//! Package-based profiles reference their template by location: an HTTP(S)
//! URL, a file path, or a name resolved against the configured hardware
//! directory and then against a base URL.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default HTTP timeout for template fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Something that turns a template location into template text.
pub trait TemplateSource: Send + Sync {
    /// Loads the template at `location`.
    fn load(&self, location: &str) -> Result<String>;
}

/// File system and HTTP template source.
#[derive(Debug, Clone)]
pub struct DefaultTemplateSource {
    hardware_dir: Option<PathBuf>,
    base_url: Option<String>,
    timeout: Duration,
}

impl Default for DefaultTemplateSource {
    fn default() -> Self {
        Self {
            hardware_dir: None,
            base_url: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl DefaultTemplateSource {
    /// Creates a source that only resolves absolute paths and URLs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            hardware_dir: config.paths.hardware_dir.clone(),
            base_url: config.network.template_base_url.clone(),
            timeout: Duration::from_secs(config.network.fetch_timeout_secs),
        }
    }

    /// Resolves relative locations against a directory.
    #[must_use]
    pub fn with_hardware_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.hardware_dir = Some(dir.into());
        self
    }

    /// Resolves relative locations against a URL prefix.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching hardware template {}", url);
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .get(url)
            .call()
            .with_context(|| format!("Failed to fetch {url}"))?;
        response
            .into_string()
            .with_context(|| format!("Failed to read response body from {url}"))
    }

    fn read(path: &Path) -> Result<String> {
        debug!("Reading hardware template {}", path.display());
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl TemplateSource for DefaultTemplateSource {
    fn load(&self, location: &str) -> Result<String> {
        if is_url(location) {
            return self.fetch(location);
        }

        let path = Path::new(location);
        if path.is_absolute() || path.exists() {
            return Self::read(path);
        }
        if let Some(dir) = &self.hardware_dir {
            let candidate = dir.join(location);
            if candidate.exists() {
                return Self::read(&candidate);
            }
        }
        if let Some(base) = &self.base_url {
            let url = format!("{}/{}", base.trim_end_matches('/'), location);
            return self.fetch(&url);
        }

        bail!("Template '{}' not found (no hardware directory or base URL matched)", location)
    }
}

/// In-memory templates keyed by location.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateSource {
    templates: HashMap<String, String>,
}

impl StaticTemplateSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under a location.
    #[must_use]
    pub fn with(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(location.into(), text.into());
        self
    }
}

impl TemplateSource for StaticTemplateSource {
    fn load(&self, location: &str) -> Result<String> {
        self.templates
            .get(location)
            .cloned()
            .with_context(|| format!("Template '{location}' is not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_location_uses_hardware_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("panel.yaml"), "display:\n").unwrap();

        let source = DefaultTemplateSource::new().with_hardware_dir(dir.path());
        assert_eq!(source.load("panel.yaml").unwrap(), "display:\n");
    }

    #[test]
    fn test_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abs.yaml");
        fs::write(&path, "lvgl:\n").unwrap();

        let source = DefaultTemplateSource::new();
        assert_eq!(source.load(&path.display().to_string()).unwrap(), "lvgl:\n");
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = DefaultTemplateSource::new().with_hardware_dir(dir.path());
        let err = source.load("nope-does-not-exist.yaml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_static_source() {
        let source = StaticTemplateSource::new().with("a.yaml", "x");
        assert_eq!(source.load("a.yaml").unwrap(), "x");
        assert!(source.load("b.yaml").is_err());
    }
}
