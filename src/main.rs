use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use gymtrack_api::config::config;
use gymtrack_api::database::{manager, DocumentStore, PostgresStore};
use gymtrack_api::services::{BodyMetricsService, UsersService};
use gymtrack_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymtrack_api=debug,tower_http=info".into()),
        )
        .init();

    let config = config();

    let pool = manager::connect(&config.database)
        .await
        .context("failed to open database pool")?;
    manager::health_check(&pool)
        .await
        .context("database is unreachable")?;

    let store = Arc::new(PostgresStore::new(pool));
    store
        .ensure_collection(&UsersService::collection_spec())
        .await
        .context("failed to prepare users collection")?;
    store
        .ensure_collection(&BodyMetricsService::collection_spec())
        .await
        .context("failed to prepare body_metrics collection")?;

    let app = app(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("gymtrack-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
