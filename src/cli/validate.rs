//! Validation command for project files.

use crate::cli::common::{
    build_compiler, load_config, print_json, read_project, CliError, CliResult,
};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Validate a project file for errors and warnings
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Path to the project file
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,
}

/// A single validation finding.
#[derive(Debug, Serialize)]
struct ValidationMessage {
    severity: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    widget: Option<String>,
}

/// JSON response of the validate command.
#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    profile: String,
    messages: Vec<ValidationMessage>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config();
        let project = read_project(&self.project)?;
        let compiler = build_compiler(&config)?;

        let report = compiler.validate(&project);
        let profile = compiler.resolve_profile(&project).profile.id;

        let mut messages: Vec<ValidationMessage> = report
            .errors
            .iter()
            .map(|e| ValidationMessage {
                severity: "error",
                message: e.message.clone(),
                page: e.page,
                widget: e.widget.clone(),
            })
            .collect();
        messages.extend(report.warnings.iter().map(|w| ValidationMessage {
            severity: "warning",
            message: w.message.clone(),
            page: None,
            widget: None,
        }));

        let valid = report.is_valid() && !(self.strict && !report.warnings.is_empty());
        let response = ValidationResponse {
            valid,
            profile,
            messages,
        };

        if self.json {
            print_json(&response)?;
        } else {
            if response.valid {
                println!("✓ Validation passed ({})", response.profile);
            } else {
                println!("✗ Validation failed ({})", response.profile);
            }
            if !response.messages.is_empty() {
                println!("\nIssues:");
                for msg in &response.messages {
                    let prefix = if msg.severity == "error" { "  ✗" } else { "  ⚠" };
                    match (&msg.widget, msg.page) {
                        (Some(widget), Some(page)) => {
                            println!("{prefix} {} (page {page}, widget {widget})", msg.message);
                        }
                        _ => println!("{prefix} {}", msg.message),
                    }
                }
            }
        }

        if !report.is_valid() {
            return Err(CliError::validation(format!(
                "Validation failed with {} error(s)",
                report.errors.len()
            )));
        }
        if self.strict && !report.warnings.is_empty() {
            return Err(CliError::validation(format!(
                "Validation failed in strict mode with {} warning(s)",
                report.warnings.len()
            )));
        }
        Ok(())
    }
}
