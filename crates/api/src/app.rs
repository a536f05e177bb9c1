use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{BillingGate, NotificationDispatcher};

use crate::config::Config;
use crate::routes::{events, health, locations, settings};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub billing: Arc<dyn BillingGate>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    dispatcher: Arc<dyn NotificationDispatcher>,
    billing: Arc<dyn BillingGate>,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        dispatcher,
        billing,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Tracking routes. Auth resolution happens inside the handlers
    // because the last fallback in the chain reads the request body.
    let tracking_routes = Router::new()
        .route("/api/v1/locations", post(locations::ingest_location))
        .route("/api/v1/locations/current", get(locations::current_locations))
        .route(
            "/api/v1/events",
            post(events::log_event).get(events::list_events),
        )
        .route(
            "/api/v1/settings",
            get(settings::get_settings).put(settings::update_settings),
        );

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/health", get(health::health_check));

    Router::new()
        .merge(public_routes)
        .merge(tracking_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
