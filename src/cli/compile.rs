//! Compile command.

use crate::cli::common::{
    build_compiler, load_config, print_json, read_project, CliError, CliResult,
};
use crate::compiler::{CompileOutput, Severity};
use crate::models::{Orientation, RenderingMode};
use chrono::Local;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Compile a project into a device configuration
#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// Path to the project file (.json, .json5, .yaml)
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Override the project's device id
    #[arg(long, value_name = "ID")]
    pub device: Option<String>,

    /// Override the project's orientation
    #[arg(long, value_name = "ORIENTATION")]
    pub orientation: Option<Orientation>,

    /// Override the rendering mode (auto, direct, lvgl)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<RenderingMode>,

    /// Use this hardware template instead of the profile's
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Omit the generation timestamp
    #[arg(long)]
    pub deterministic: bool,

    /// Print `{document, diagnostics}` as JSON
    #[arg(long)]
    pub json: bool,
}

impl CompileArgs {
    /// Execute the compile command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config();
        let mut project = read_project(&self.project)?;

        if project.device_model.trim().is_empty() {
            project.device_model.clone_from(&config.compile.default_device);
        }
        if let Some(device) = &self.device {
            project.device_model.clone_from(device);
        }
        match self.orientation {
            Some(orientation) => project.orientation = orientation,
            // a landscape project is indistinguishable from one that left orientation out
            None if project.orientation == Orientation::default() => {
                project.orientation = config.compile.default_orientation;
            }
            None => {}
        }
        if let Some(mode) = self.mode {
            project.rendering_mode = mode;
        }

        let mut compiler = build_compiler(&config)?;
        if let Some(path) = &self.template {
            let template = fs::read_to_string(path).map_err(|e| {
                CliError::io(format!("Failed to read template {}: {e}", path.display()))
            })?;
            compiler = compiler.with_template_override(template);
        }

        let mut output = compiler.compile(&project);
        if !self.deterministic {
            output.document = format!(
                "# Generated: {}\n{}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                output.document
            );
        }

        if self.json {
            print_json(&output)?;
        } else {
            report_diagnostics(&output);
        }

        match &self.out {
            Some(path) => {
                fs::write(path, &output.document).map_err(|e| {
                    CliError::io(format!("Failed to write {}: {e}", path.display()))
                })?;
                info!("Wrote {}", path.display());
                if !self.json {
                    eprintln!("✓ Compiled {} → {}", project.name, path.display());
                }
            }
            None if !self.json => print!("{}", output.document),
            None => {}
        }

        Ok(())
    }
}

fn report_diagnostics(output: &CompileOutput) {
    for diagnostic in &output.diagnostics {
        let prefix = match diagnostic.severity {
            Severity::Error => "✗",
            Severity::Warning => "⚠",
        };
        eprintln!("{prefix} {diagnostic}");
    }
}
