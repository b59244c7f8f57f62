//! capacity_server: standalone REST server for capacity management.
//!
//! Configuration comes from environment variables (optionally a `.env`
//! file); see `capacity_server::config` for the full list.

use std::sync::Arc;

use anyhow::Context;
use capacity_core::ports::{CapacityPersistencePort, TechnologiesGateway};
use capacity_core::service::{CapacityServicePort, CapacityUseCase};
use capacity_postgres::PgCapacityStore;
use capacity_server::config::ServerConfig;
use capacity_server::router::build_router;
use capacity_tech_client::HttpTechnologiesGateway;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,capacity_server=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Connected to database");

    let store = PgCapacityStore::new(pool);
    if config.run_migrations {
        store
            .run_migrations()
            .await
            .context("failed to run migrations")?;
        tracing::info!("Migrations applied");
    }

    tracing::info!(
        base_url = %config.technology.base_url,
        timeout_ms = config.technology.timeout.as_millis() as u64,
        "Technology service client configured"
    );
    let gateway = HttpTechnologiesGateway::new(config.technology.clone())?;

    let persistence: Arc<dyn CapacityPersistencePort> = Arc::new(store);
    let technologies: Arc<dyn TechnologiesGateway> = Arc::new(gateway);
    let service: Arc<dyn CapacityServicePort> =
        Arc::new(CapacityUseCase::new(persistence, technologies));

    let app = build_router(service);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("capacity_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
