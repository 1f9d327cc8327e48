use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use yoga_master_api::cli::Cli;
use yoga_master_api::config::{AppConfig, DEVELOPMENT_SECRET};
use yoga_master_api::database::{collections, DatabaseManager, DocumentStore, MemoryDocumentStore, PgDocumentStore};
use yoga_master_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ACCESS_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yoga_master_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!("Starting Yoga Master API in {:?} mode", config.environment);
    if config.security.jwt_secret == DEVELOPMENT_SECRET {
        warn!("ACCESS_SECRET not set, signing tokens with the development secret");
    }

    let mut postgres: Option<Arc<PgDocumentStore>> = None;
    let store: Arc<dyn DocumentStore> = if cli.memory {
        warn!("Using the in-memory document store; documents are lost on shutdown");
        Arc::new(MemoryDocumentStore::new())
    } else {
        config.database_url()?;
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to the document database")?;
        let store = Arc::new(PgDocumentStore::new(pool, &config.database));
        store
            .ensure_collections(collections::ALL)
            .await
            .context("failed to create document collections")?;
        postgres = Some(store.clone());
        store
    };

    let state = AppState::new(store, config);

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cli.host, cli.port))?;
    info!("Yoga Master API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(store) = postgres {
        store.close().await;
        info!("Database pool closed");
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
