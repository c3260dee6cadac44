use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use feeledger::{AppConfig, AppState, LedgerService, MemoryDocumentStore, build_router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::try_parse().context("failed to load configuration")?;
    if config.store_page_size == 0 {
        anyhow::bail!("store page size must be positive");
    }

    let store = Arc::new(MemoryDocumentStore::with_page_size(config.store_page_size));
    let ledger = Arc::new(LedgerService::new(store, config.service_config()));
    let app = build_router(AppState::new(ledger));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        bind_addr = %config.bind_addr,
        store_page_size = config.store_page_size,
        max_page_limit = config.max_page_limit,
        "fee ledger started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "feeledger=debug,tower_http=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolves on ctrl+c or, on unix, SIGTERM.
async fn shutdown_signal() {
    tokio::select! {
        () = interrupted() => info!("ctrl+c received, draining connections"),
        () = terminated() => info!("SIGTERM received, draining connections"),
    }
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "ctrl+c handler failed");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminated() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            error!(error = %err, "SIGTERM handler failed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}
