//! Project file loading and saving.
//!
//! Projects are stored as JSON. JSON5 and YAML are accepted on input so
//! hand-written projects can carry comments.

use crate::models::Project;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Input formats understood by [`load_project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    /// Plain JSON
    Json,
    /// JSON5 (comments, trailing commas, unquoted keys)
    Json5,
    /// YAML
    Yaml,
}

impl ProjectFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "json5" => Ok(Self::Json5),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => bail!(
                "Unsupported project file extension '{}' (expected .json, .json5, .yaml or .yml)",
                path.display()
            ),
        }
    }
}

/// Parses project text in the given format.
pub fn parse_project_str(content: &str, format: ProjectFormat) -> Result<Project> {
    match format {
        ProjectFormat::Json => serde_json::from_str(content).context("Invalid project JSON"),
        ProjectFormat::Json5 => json5::from_str(content).context("Invalid project JSON5"),
        ProjectFormat::Yaml => serde_yml::from_str(content).context("Invalid project YAML"),
    }
}

/// Loads a project file, picking the format from its extension.
pub fn load_project(path: &Path) -> Result<Project> {
    if !path.is_file() {
        bail!("Project file not found: {}", path.display());
    }
    let format = ProjectFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    parse_project_str(&content, format)
        .with_context(|| format!("Failed to parse project file: {}", path.display()))
}

/// Writes a project as pretty-printed JSON.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(project).context("Failed to serialize project")?;
    fs::write(path, format!("{content}\n"))
        .with_context(|| format!("Failed to write project file: {}", path.display()))
}
