//! Client-reported event logging and the family event feed.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use domain::models::{LogEventRequest, LogEventResponse, TrackingEvent};
use persistence::repositories::{TrackingEventInput, TrackingEventRepository, ZoneRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{auth, Caller};

/// `POST /api/v1/events`. Records a client-reported event (SOS, pause,
/// resume, and friends) into the append-only event log. A referenced
/// zone must belong to the caller's family.
pub async fn log_event(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<LogEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = auth::resolve_caller(
        &state.pool,
        caller.map(|Extension(c)| c),
        &headers,
        &jar,
        &state.config.security.session_cookie,
        request.session_token.as_deref(),
    )
    .await?;

    request.validate()?;

    if state.billing.is_locked(caller.family_id).await {
        return Err(ApiError::SubscriptionLocked);
    }

    if let Some(zone_id) = request.zone_id {
        let zones = ZoneRepository::new(state.pool.clone());
        let zone = zones
            .find_by_id(zone_id)
            .await?
            .filter(|z| z.family_id == caller.family_id);
        if zone.is_none() {
            return Err(ApiError::NotFound(format!("Zone {} not found", zone_id)));
        }
    }

    let events = TrackingEventRepository::new(state.pool.clone());
    let stored = events
        .append(TrackingEventInput {
            user_id: caller.user_id,
            family_id: caller.family_id,
            event_type: request.event_type,
            zone_id: request.zone_id,
            latitude: request.latitude,
            longitude: request.longitude,
            payload: request.payload.clone(),
        })
        .await?;

    tracing::info!(
        user_id = %caller.user_id,
        event_type = request.event_type.as_str(),
        event_id = stored.id,
        "Client event recorded"
    );

    Ok((
        AppendHeaders([("x-auth-method", caller.method.as_str())]),
        Json(LogEventResponse {
            success: true,
            event_id: stored.id,
        }),
    ))
}

/// `GET /api/v1/events`. Newest events for the caller's family.
pub async fn list_events(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<Vec<TrackingEvent>>, ApiError> {
    let caller = auth::resolve_caller(
        &state.pool,
        caller.map(|Extension(c)| c),
        &headers,
        &jar,
        &state.config.security.session_cookie,
        None,
    )
    .await?;

    let events = TrackingEventRepository::new(state.pool.clone());
    let rows = events
        .list_for_family(caller.family_id, state.config.tracking.event_list_limit)
        .await?;

    // Rows with an event type this build no longer knows are skipped
    // rather than failing the whole listing.
    let events: Vec<TrackingEvent> = rows.into_iter().filter_map(|row| row.into_event()).collect();
    Ok(Json(events))
}
