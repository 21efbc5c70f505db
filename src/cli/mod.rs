//! CLI command handlers for LazyESP.
//!
//! Headless, scriptable access to the compiler for automation and CI.

pub mod common;
pub mod compile;
pub mod config;
pub mod import;
pub mod profiles;
pub mod validate;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use compile::CompileArgs;
pub use config::ConfigArgs;
pub use import::ImportArgs;
pub use profiles::ProfilesArgs;
pub use validate::ValidateArgs;
