//! vault-tui - browse a secrets backend from the terminal
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use vault_tui::{run_headless, HeadlessOptions, OutputFormat};
use vtui_app::config::{load_settings, validate_settings};
use vtui_core::prelude::*;

/// vault-tui - browse a secrets backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "vtui")]
#[command(about = "Browse a secrets backend from the terminal", long_about = None)]
struct Args {
    /// JSON fixture served as the backend
    #[arg(long, value_name = "FILE")]
    fixture: PathBuf,

    /// Settings file (defaults to <config dir>/vault-tui/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listing requests allowed per discovery run
    #[arg(long)]
    max_requests: Option<usize>,

    /// Skip the capability lookup after discovery
    #[arg(long)]
    no_capabilities: bool,

    /// Print the discovery report as JSON instead of the rendered tree
    #[arg(long)]
    json: bool,

    /// Simulated latency per backend call, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().map_err(|e| Error::terminal(e.to_string()))?;
    let args = Args::parse();

    if let Err(e) = vtui_core::logging::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let mut settings = load_settings(args.config.as_deref());
    if let Some(max) = args.max_requests {
        settings.discovery.max_requests = max;
    }
    if args.no_capabilities {
        settings.discovery.annotate_capabilities = false;
    }
    validate_settings(&settings)?;

    let options = HeadlessOptions {
        fixture: args.fixture,
        settings,
        format: if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
        latency: Duration::from_millis(args.latency_ms),
    };

    match run_headless(options).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Headless run failed: {}", e);
            Err(e)
        }
    }
}
