//! LazyESP - display layout compiler for ESPHome devices
//!
//! Turns a project file (pages of widgets) into a device configuration
//! document and reads generated documents back into projects.

use clap::{Parser, Subcommand};
use lazyesp::cli::{CompileArgs, ConfigArgs, ImportArgs, ProfilesArgs, ValidateArgs};
use lazyesp::constants::{APP_BINARY_NAME, APP_NAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LazyESP - display layout compiler for ESPHome devices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project into a device configuration
    Compile(CompileArgs),
    /// Validate a project file
    Validate(ValidateArgs),
    /// List hardware profiles
    Profiles(ProfilesArgs),
    /// Rebuild a project from a generated document
    Import(ImportArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Command::Compile(args) => args.execute(),
        Command::Validate(args) => args.execute(),
        Command::Profiles(args) => args.execute(),
        Command::Import(args) => args.execute(),
        Command::Config(args) => args.execute(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        eprintln!("Run '{APP_BINARY_NAME} --help' for usage.");
        std::process::exit(err.exit_code());
    }
}
