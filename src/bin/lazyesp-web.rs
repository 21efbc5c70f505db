//! LazyESP Web Server Binary
//!
//! Starts the REST API used by browser-based layout editors.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001)
//! lazyesp-web
//!
//! # Specify port and a hardware recipe directory
//! lazyesp-web --port 8080 --hardware-dir ./hardware
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lazyesp::config::Config;
use lazyesp::web;

/// LazyESP Web Server - REST API for layout editors
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory of hardware recipe templates (overrides the config file)
    #[arg(long, value_name = "DIR")]
    hardware_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().unwrap_or_default();
    if let Some(dir) = args.hardware_dir {
        config.set_hardware_dir(dir)?;
    }
    if let Some(dir) = &config.paths.hardware_dir {
        info!("Hardware directory: {}", dir.display());
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    web::run_server(config, addr).await
}
