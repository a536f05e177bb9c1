//! Per-user tracking settings read and write.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use domain::models::{TrackingSettings, UpdateSettingsRequest};
use persistence::repositories::SettingsRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{auth, Caller};

/// `GET /api/v1/settings`. Defaults apply when the user never wrote a
/// settings row.
pub async fn get_settings(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<TrackingSettings>, ApiError> {
    let caller = auth::resolve_caller(
        &state.pool,
        caller.map(|Extension(c)| c),
        &headers,
        &jar,
        &state.config.security.session_cookie,
        None,
    )
    .await?;

    let repo = SettingsRepository::new(state.pool.clone());
    let settings = match repo.find(caller.user_id).await? {
        Some(entity) => entity.into(),
        None => TrackingSettings::defaults(caller.user_id),
    };
    Ok(Json(settings))
}

/// `PUT /api/v1/settings`. Partial update; numeric fields are clamped
/// to their ranges and the three mode thresholds must stay ordered.
pub async fn update_settings(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<TrackingSettings>, ApiError> {
    let caller = auth::resolve_caller(
        &state.pool,
        caller.map(|Extension(c)| c),
        &headers,
        &jar,
        &state.config.security.session_cookie,
        None,
    )
    .await?;

    let repo = SettingsRepository::new(state.pool.clone());
    let current = match repo.find(caller.user_id).await? {
        Some(entity) => entity.into(),
        None => TrackingSettings::defaults(caller.user_id),
    };

    let next = request
        .apply(&current)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let stored = repo.upsert(&next).await?;
    tracing::info!(
        user_id = %caller.user_id,
        update_interval_secs = next.update_interval_secs,
        tracking_enabled = next.tracking_enabled,
        "Tracking settings updated"
    );
    Ok(Json(stored.into()))
}
