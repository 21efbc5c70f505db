//! Import command: rebuild a project from a generated document.

use crate::cli::common::{print_json, CliError, CliResult};
use crate::parser::{import_document, save_project};
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Rebuild a project from a generated document
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Path to a document produced by `compile`
    #[arg(short, long, value_name = "FILE")]
    pub document: PathBuf,

    /// Write the project here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl ImportArgs {
    /// Execute the import command
    pub fn execute(&self) -> CliResult<()> {
        let text = fs::read_to_string(&self.document).map_err(|e| {
            CliError::io(format!(
                "Failed to read document {}: {e}",
                self.document.display()
            ))
        })?;

        let imported = import_document(&text);
        for line in &imported.skipped {
            eprintln!("⚠ Skipped unreadable annotation: {line}");
        }
        if imported.project.pages.is_empty() {
            return Err(CliError::validation(
                "Document contains no pages or widget annotations",
            ));
        }
        if !imported.has_settings {
            eprintln!("⚠ Document has no project settings line; defaults were used");
        }

        match &self.out {
            Some(path) => {
                save_project(&imported.project, path)
                    .map_err(|e| CliError::io(format!("{e:#}")))?;
                let widgets: usize = imported.project.pages.iter().map(|p| p.widgets.len()).sum();
                eprintln!(
                    "✓ Imported {} page(s), {} widget(s) → {}",
                    imported.project.pages.len(),
                    widgets,
                    path.display()
                );
                Ok(())
            }
            None => print_json(&imported.project),
        }
    }
}
