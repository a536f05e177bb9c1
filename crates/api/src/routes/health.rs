//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::app::AppState;

/// `GET /health`. Reports process liveness and database reachability.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok,
        })),
    )
}
