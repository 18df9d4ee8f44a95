use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use marketdesk_models::config::Credentials;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "marketdesk",
    about = "Market dashboard backend - quotes, series, options, news and LLM analysis agents over JSON"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/marketdesk.toml")]
    config: PathBuf,

    /// Listen address, overrides `server.bind`
    #[arg(short, long, env = "MARKETDESK_BIND")]
    bind: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; keys may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = marketdesk::load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let credentials = Credentials::from_env();
    info!(?credentials, "Loaded credentials");

    let bind = config.server.bind.clone();
    let state = marketdesk::build_state(config, credentials)?;
    let app = marketdesk::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %bind, "marketdesk listening");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
            cancel.cancel();
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("Server error")?;

    info!("marketdesk stopped");
    Ok(())
}
