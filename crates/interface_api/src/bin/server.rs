//! Clinic Core - API Server Binary
//!
//! Starts the HTTP API server for the clinic admin core.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store, default configuration
//! cargo run --bin clinic-api
//!
//! # PostgreSQL store
//! CLINIC_DATABASE_URL=postgres://localhost/clinic CLINIC_PORT=8080 cargo run --bin clinic-api
//! ```
//!
//! # Environment Variables
//!
//! * `CLINIC_HOST` - Server host (default: 0.0.0.0)
//! * `CLINIC_PORT` - Server port (default: 8080)
//! * `CLINIC_JWT_SECRET` - JWT signing secret (required in production)
//! * `CLINIC_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `CLINIC_DATABASE_URL` - PostgreSQL connection string; in-memory when unset
//! * `CLINIC_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `CLINIC_QUOTATION_VALIDITY_DAYS`, `CLINIC_INVOICE_DUE_DAYS` (default: 30)
//! * `CLINIC_INTER_STATE_DEFAULT` (default: false)
//! * `CLINIC_RETRY_MAX_ATTEMPTS` (default: 3), `CLINIC_RETRY_BASE_DELAY_MS` (default: 50)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_billing::{DocumentStore, InMemoryDocumentStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresDocumentStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading CLINIC_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Clinic Core API Server"
    );

    let store = create_store(&config).await?;
    let state = AppState::new(store, config.clone()).context("building billing engine")?;
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("parsing server address")?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connects to PostgreSQL and applies migrations when a database URL is
/// configured, otherwise falls back to the in-memory store.
async fn create_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(DatabaseConfig::new(url.as_str()))
                .await
                .context("connecting to PostgreSQL")?;
            run_migrations(&pool).await.context("applying migrations")?;
            tracing::info!("Database ready");
            Ok(Arc::new(PostgresDocumentStore::new(pool)))
        }
        None => {
            tracing::warn!("No database URL configured; using the in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
