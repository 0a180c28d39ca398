//! cli
//!
//! Command-line interface layer for scmbridge.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Resolve a [`ClientConfig`](crate::core::config::ClientConfig) and
//!   delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers call one [`Forge`](crate::forge::Forge)
//! operation each and print the canonical result as JSON; no provider
//! knowledge lives here.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::forge::create_forge;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SCMB_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;
    let client = config
        .client_config(cli.provider.as_deref(), cli.base_url.as_deref())
        .context("Failed to resolve client configuration")?;
    tracing::debug!(provider = %client.provider, base_url = %client.base_url, "client configured");

    let forge = create_forge(&client);
    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(commands::dispatch(cli.command, forge.as_ref()))?;
    println!("{}", output);
    Ok(())
}

/// Install the `tracing` subscriber.
///
/// `SCMB_LOG` takes precedence; otherwise `--debug` selects `debug` and
/// the default is `warn`. Logs go to stderr so stdout stays pure JSON.
fn init_logging(debug: bool) {
    let fallback = if debug { "scmbridge=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
