use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use portfolio_api::app::{app, AppState};
use portfolio_api::auth::{Authenticator, TokenSigner};
use portfolio_api::config::{AppConfig, StoreBackend};
use portfolio_api::store::{DocumentStore, MemoryStore, PgStore};

#[derive(Parser)]
#[command(name = "portfolio-api")]
#[command(about = "Portfolio backend - contacts, projects and timeline per user")]
#[command(version)]
struct Args {
    #[arg(long, help = "Bind address (overrides HOST)")]
    host: Option<String>,

    #[arg(long, help = "Listen port (overrides PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portfolio_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Portfolio API in {:?} mode", config.environment);

    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            Arc::new(PgStore::connect(url, &config.store).await?)
        }
    };

    let signer = TokenSigner::new(&config.security.jwt_secret, config.security.jwt_expiry_minutes);
    let authenticator = Arc::new(Authenticator::new(store.clone(), signer));
    let router = app(AppState::new(store, authenticator), &config.security);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Portfolio API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Portfolio API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
