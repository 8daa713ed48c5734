use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use homework_core::Config;
use homework_core::config::DEFAULT_CONFIG_PATH;
use homework_server::AppState;

#[derive(Parser)]
#[command(name = "homework-server")]
#[command(about = "Serve the homework list and its calendar feed over HTTP")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let state = AppState::new(config).context("Failed to open homework database")?;
    let app = homework_server::router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!("homework-server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
