#![forbid(unsafe_code)]

//! `copydesk` — content dashboard AI core server binary.
//!
//! Bootstraps configuration, connects `SQLite`, and starts the HTTP API
//! hosting the edit agent and the brand-analysis workflow.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use copydesk::agent::gateway::GatewayClient;
use copydesk::config::GlobalConfig;
use copydesk::persistence::brand_repo::SqliteBrandRepo;
use copydesk::persistence::progress_store::SqliteProgressStore;
use copydesk::persistence::{db, retention};
use copydesk::server::{self, AppState};
use copydesk::workflow::fetch::HttpFetcher;
use copydesk::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "copydesk", about = "Content dashboard AI core server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("copydesk server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials()?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let database = Arc::new(db::connect(&config.db_path).await?);
    info!("database connected");

    // ── Start retention service ─────────────────────────
    let ct = CancellationToken::new();
    let retention_handle = retention::spawn_retention_task(Arc::clone(&database), ct.clone());
    info!("retention service started");

    // ── Build shared application state ──────────────────
    let model = Arc::new(GatewayClient::new(
        &config.gateway,
        config.gateway.api_key.clone(),
    )?);
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        model,
        fetcher: Arc::new(HttpFetcher::new()?),
        brand_repo: Arc::new(SqliteBrandRepo::new(Arc::clone(&database))),
        progress: Arc::new(SqliteProgressStore::new(Arc::clone(&database))),
    });

    // ── Serve until shutdown ────────────────────────────
    let server_ct = ct.clone();
    let server_state = Arc::clone(&state);
    let server_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(server_state, server_ct).await {
            error!(%err, "http server failed");
        }
    });

    info!("copydesk ready");
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = tokio::join!(server_handle, retention_handle);
    info!("copydesk shut down");
    Ok(())
}

/// Wait for ctrl-c.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))
}
