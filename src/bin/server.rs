use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use talktocode::{config, logging, router, AppState, Config};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "TALKTOCODE_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level when RUST_LOG is unset
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = config::load_dotenv(None);
    let cli = Cli::parse();

    let source = Config::locate(cli.config.as_deref());
    let mut config = Config::load(source.as_deref()).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init(&config.log_level)?;
    if let Some(path) = &dotenv {
        debug!("Loaded environment from {}", path.display());
    }
    match &source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    config.validate()?;

    if config.github_token().is_none() {
        warn!("GITHUB_TOKEN not set; GitHub requests are unauthenticated and heavily rate limited");
    }
    if config.gemini_api_key().is_err() {
        warn!("GEMINI_API_KEY not set; analysis endpoints will fail");
    }

    let address = config.bind_address();
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("TalkToCode backend listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
