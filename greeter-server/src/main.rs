//! Binary crate for the `greeter` HTTP service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading `.env` and initializing logging
//! - Running the server or the interactive configuration

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before logging, so RUST_LOG may come from the file.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greeter_server=info,greeter_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Error loading .env file: {e}"),
    }

    let cmd = cli::Cli::parse();
    cmd.run().await
}
