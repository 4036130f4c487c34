//! Order API Server Binary
//!
//! Starts the HTTP API serving the order fetch strategies.
//!
//! # Usage
//!
//! ```bash
//! # Run against PostgreSQL
//! DATABASE_URL=postgres://localhost/shop cargo run --bin order-api
//!
//! # Run without a database
//! API_STORAGE=memory cargo run --bin order-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_STORAGE` - `postgres` or `memory` (default: postgres)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_SEED_SAMPLE_DATA` - Insert the sample shop when empty (default: true)
//! * `API_DEFAULT_BATCH_FETCH_SIZE` - Owners per batched query (default: 100)
//! * `API_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `API_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_order::{seed_sample_data, InMemoryOrderStore, OrderPort, OrderQueryPort};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresOrderAdapter};
use interface_api::config::{ApiConfig, LogFormat, StorageBackend};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("failed to load configuration")?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        batch_fetch_size = config.default_batch_fetch_size,
        "Starting Order API Server"
    );

    match config.storage {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(
                DatabaseConfig::new(config.database_url.clone())
                    .max_connections(config.max_connections),
            )
            .await
            .context("failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("failed to run migrations")?;

            serve(Arc::new(PostgresOrderAdapter::new(pool)), config).await
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on shutdown");
            serve(Arc::new(InMemoryOrderStore::new()), config).await
        }
    }
}

/// Seeds the store if configured and serves until shutdown
async fn serve<S>(store: Arc<S>, config: ApiConfig) -> anyhow::Result<()>
where
    S: OrderPort + OrderQueryPort,
{
    if config.seed_sample_data {
        let inserted = seed_sample_data(store.as_ref())
            .await
            .context("failed to seed sample data")?;
        tracing::info!(inserted, "Sample data checked");
    }

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    let app = create_router(AppState::new(store, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
