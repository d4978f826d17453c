//! # Strata API Server
//!
//! Serves the Strata HTTP API over PostgreSQL or the in-memory store.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORAGE_BACKEND=memory cargo run -p strata-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use strata_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use strata_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    services::Services,
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "strata_api=debug,strata_shared=info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Strata API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut pool = None;
    let store: Arc<dyn Store> = match (config.storage, &config.database) {
        (StorageBackend::Postgres, Some(database)) => {
            let db_config = DatabaseConfig {
                url: database.url.clone(),
                max_connections: database.max_connections,
                ..DatabaseConfig::default()
            };
            let db = create_pool(db_config)
                .await
                .context("Failed to connect to PostgreSQL")?;
            run_migrations(&db).await.context("Failed to run migrations")?;

            pool = Some(db.clone());
            Arc::new(PgStore::new(db))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("DATABASE_URL is required for the postgres backend")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let services = Services::new(store, config.jwt.secret.clone(), config.password.into());
    let bind_address = config.bind_address();
    let app = build_router(AppState::new(services, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Server stopped");

    Ok(())
}
