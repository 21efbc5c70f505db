//! Reading projects and generated documents.
//!
//! Project files are the compiler's input; generated documents can be read
//! back into a project through their annotations.

pub mod import;
pub mod project;

pub use import::{import_document, ImportedProject};
pub use project::{load_project, parse_project_str, save_project, ProjectFormat};
