//! Shared CLI types and helpers.

use crate::compiler::Compiler;
use crate::config::Config;
use crate::hardware::{DefaultTemplateSource, HardwareCatalog};
use crate::models::Project;
use crate::parser::load_project;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Input was understood but invalid
    ValidationError = 1,
    /// A file, network or serialization operation failed
    IoError = 2,
}

impl ExitCode {
    /// Numeric process exit code.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by CLI commands.
#[derive(Debug, Clone)]
pub struct CliError {
    /// Exit code to terminate with
    pub kind: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Invalid input (exit code 1).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// IO or serialization failure (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        self.kind.code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type of CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Loads the config, falling back to defaults with a warning.
pub fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable configuration: {:#}", e);
        Config::default()
    })
}

/// Loads the built-in catalog plus recipes from the configured hardware dir.
pub fn load_catalog(config: &Config) -> CliResult<HardwareCatalog> {
    let mut catalog = HardwareCatalog::load()
        .map_err(|e| CliError::io(format!("Failed to load hardware catalog: {e:#}")))?;
    if let Some(dir) = &config.paths.hardware_dir {
        catalog
            .load_recipes_from(dir)
            .map_err(|e| CliError::io(format!("Failed to load hardware recipes: {e:#}")))?;
    }
    Ok(catalog)
}

/// Builds a compiler from the config.
pub fn build_compiler(config: &Config) -> CliResult<Compiler> {
    Ok(Compiler::new(
        load_catalog(config)?,
        Box::new(DefaultTemplateSource::from_config(config)),
    ))
}

/// Loads a project file.
pub fn read_project(path: &Path) -> CliResult<Project> {
    load_project(path).map_err(|e| CliError::io(format!("Failed to load project: {e:#}")))
}

/// Prints a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
