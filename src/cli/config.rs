//! Configuration management CLI commands.

use crate::cli::common::{print_json, CliError, CliResult};
use crate::config::Config;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Directory scanned for hardware recipe templates
    #[arg(long, value_name = "DIR")]
    hardware_dir: Option<PathBuf>,

    /// Device used by projects without one
    #[arg(long, value_name = "ID")]
    default_device: Option<String>,

    /// Template fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Set(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = Config::load()
            .map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))?;

        if self.json {
            print_json(&config)
        } else {
            output_human_readable(&config);
            Ok(())
        }
    }
}

impl ConfigSetArgs {
    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.hardware_dir.is_none()
            && self.default_device.is_none()
            && self.fetch_timeout.is_none()
        {
            return Err(CliError::validation(
                "At least one configuration option must be specified: --hardware-dir, --default-device, or --fetch-timeout",
            ));
        }

        let mut config = Config::load().unwrap_or_default();

        if let Some(dir) = &self.hardware_dir {
            config.paths.hardware_dir = Some(dir.clone());
        }
        if let Some(device) = &self.default_device {
            config.compile.default_device.clone_from(device);
        }
        if let Some(timeout) = self.fetch_timeout {
            config.network.fetch_timeout_secs = timeout;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");
        Ok(())
    }
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    println!("LazyESP Configuration");
    println!("=====================");
    println!();

    println!("Paths:");
    match &config.paths.hardware_dir {
        Some(dir) => println!("  Hardware Directory: {}", dir.display()),
        None => println!("  Hardware Directory: (not configured)"),
    }
    println!();

    println!("Compile:");
    println!("  Default Device: {}", config.compile.default_device);
    println!("  Default Orientation: {}", config.compile.default_orientation);
    println!();

    println!("Network:");
    println!("  Fetch Timeout: {}s", config.network.fetch_timeout_secs);
    match &config.network.template_base_url {
        Some(url) => println!("  Template Base URL: {url}"),
        None => println!("  Template Base URL: (not configured)"),
    }
    println!();
}
