//! psb-bot - private server board
//!
//! Serves the HTTP adapter the chat-platform bridge talks to and keeps the
//! intake form and board summary published.

use anyhow::{Context, Result};
use clap::Parser;
use psb_bot::config::BotConfig;
use psb_bot::{build_router, startup};
use psb_common::config::{load_toml_or_default, RootFolderInitializer, RootFolderResolver};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODULE_NAME: &str = "psb-bot";

#[derive(Parser, Debug)]
#[command(name = "psb-bot")]
#[command(about = "Private server board for a game community")]
#[command(version)]
struct Args {
    /// TOML bootstrap file (defaults to <config_dir>/psb/psb-bot.toml)
    #[arg(short, long, env = "PSB_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder for the snapshot and artifact ledger
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// HTTP bind address
    #[arg(short, long, env = "PSB_BIND")]
    bind: Option<String>,

    /// Identity allowed to issue moderation commands
    #[arg(long, env = "PSB_MODERATOR_ID")]
    moderator_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new(MODULE_NAME).with_cli_override(args.root_folder.clone());
    let config_path = args.config.clone().or_else(|| resolver.config_file_path());
    let mut config: BotConfig = match &config_path {
        Some(path) => load_toml_or_default(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BotConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "psb_bot={0},psb_common={0},tower_http=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting psb-bot v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => info!("No config file at {}, using defaults", path.display()),
        None => info!("No config directory, using defaults"),
    }

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(moderator_id) = args.moderator_id {
        config.moderator_id = Some(moderator_id);
    }

    let root_folder = resolver
        .with_config_value(config.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let state = startup::build_state(&config, &initializer).context("Failed to build service")?;
    startup::reconcile_artifacts(&state).await;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("psb-bot listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
