//! EDF descriptor service - HTTP server for EDF header metadata extraction
//!
//! Usage:
//!   cargo run --bin edf_service                          # Use config.toml
//!   cargo run --bin edf_service -- -f service.toml       # Explicit config file
//!   cargo run --bin edf_service -- --port 9090 --secret-key "very secret"
//!
//! Endpoints:
//!   GET /api/edf/descriptor?key=..&fileUrl=..  - Download, decode and store an EDF header
//!   GET /api/edf/metadata/:id?key=..           - Fetch a stored record
//!   GET /swagger-ui                            - API documentation

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use edf_descriptor::config::Config;
use edf_descriptor::server::{create_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edf_service", about = "Extracts and stores metadata from EDF files given by URL")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long = "config", default_value = "config.toml")]
    config_file: String,

    /// HTTP server port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Pre-shared key expected from callers (overrides the config file)
    #[arg(long, env = "EDF_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,
}

fn load_config(config_file: &str) -> anyhow::Result<Config> {
    if Path::new(config_file).exists() {
        let config = Config::load(config_file)?;
        info!("Loaded configuration from {}", config_file);
        Ok(config)
    } else {
        warn!("Config file {} not found, using defaults", config_file);
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("edf_descriptor=info".parse()?)
                .add_directive("edf_service=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config_file)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(key) = args.secret_key {
        config.auth.secret_key = Some(key);
    }
    config.validate()?;

    info!(
        schemes = ?config.retrieval.allowed_schemes,
        storage = ?config.storage.backend,
        "Service configuration"
    );

    let state = AppState::from_config(&config)?;
    let app = create_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting EDF descriptor service on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
