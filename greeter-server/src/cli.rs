use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use greeter_core::{Config, ProviderId};
use greeter_server::{AppState, create_router};
use inquire::{Password, PasswordDisplayMode};
use tokio::net::TcpListener;
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "greeter", version, about = "Visitor greeter HTTP service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Interface to bind (overrides HOST and the config file).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT and the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Geolocation provider: "geoapify" or "ipgeolocation".
        #[arg(long)]
        geo_provider: Option<String>,
    },

    /// Store an API key for a provider in the config file.
    Configure {
        /// Provider short name, e.g. "geoapify" or "openweather".
        provider: String,
    },

    /// Print where the config file lives.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve {
                host,
                port,
                geo_provider,
            } => {
                let mut config = Config::load()?;
                config.apply_env()?;
                if let Some(host) = host {
                    config.host = Some(host);
                }
                if let Some(port) = port {
                    config.port = Some(port);
                }
                if let Some(provider) = geo_provider {
                    config.set_geo_provider(ProviderId::try_from(provider.as_str())?);
                }
                serve(config).await
            }
            Command::Configure { provider } => configure(&provider),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        geo_provider = %config.geo_provider_id()?,
        "Server listening on http://{addr}"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    if id.is_geolocation() && config.geo_provider.is_none() {
        config.set_geo_provider(id);
    }
    config.save()?;

    println!(
        "Saved API key for {id} to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
