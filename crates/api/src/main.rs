use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use domain::services::{MockBillingGate, MockNotificationDispatcher};

mod app;
mod config;
mod error;
mod middleware;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting Family Locator API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let db_config = persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    };
    let pool = persistence::db::create_pool(&db_config).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // The push transport and billing backend are separate deployments;
    // the mocks log instead of calling out.
    let dispatcher = Arc::new(MockNotificationDispatcher::new());
    let billing = Arc::new(MockBillingGate::unlocked());

    // Build application
    let app = app::create_app(config.clone(), pool, dispatcher, billing);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
