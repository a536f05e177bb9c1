//! Location ingestion and the family presence view.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    CurrentLocationsResponse, IngestLocationRequest, IngestLocationResponse, MemberPresence,
    PresenceStatus, TrackingSettings,
};
use persistence::repositories::{
    DeviceRepository, LocationInput, LocationRepository, SettingsRepository,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{auth, BatteryMonitor, Caller, GeofenceEvaluator};

/// `POST /api/v1/locations`. Accepts a sample from a device, runs the
/// tracking pipeline over it, and answers with the stored sample id.
///
/// Submissions inside the minimum spacing window are not stored; the
/// previous sample is echoed with `rate_limited: true` so device-side
/// retry queues drain instead of looping.
pub async fn ingest_location(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<IngestLocationRequest>,
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

    let now = Utc::now();
    let devices = DeviceRepository::new(state.pool.clone());
    let locations = LocationRepository::new(state.pool.clone());

    let device = devices
        .upsert_on_report(
            request.device_uuid,
            caller.user_id,
            request.platform.as_deref(),
            request.device_name.as_deref(),
            now,
        )
        .await?;

    // Check-then-insert without a transaction: two concurrent submissions
    // inside the window can both land. The window only exists to calm
    // duplicate-heavy clients, so the occasional extra row is acceptable.
    let spacing = state.config.tracking.min_sample_spacing_secs;
    if let Some(previous) = locations.latest_for_device(caller.user_id, device.id).await? {
        if inside_spacing_window(previous.created_at, now, spacing) {
            tracing::debug!(
                user_id = %caller.user_id,
                device_uuid = %device.device_uuid,
                age_secs = (now - previous.created_at).num_seconds(),
                "Sample inside minimum spacing window, echoing previous"
            );
            return Ok(respond(
                &caller,
                IngestLocationResponse {
                    success: true,
                    location_id: previous.id,
                    device_id: device.device_uuid,
                    timestamp: previous.created_at,
                    rate_limited: true,
                },
            ));
        }
    }

    let stored = locations
        .insert(LocationInput {
            device_id: device.id,
            user_id: caller.user_id,
            family_id: caller.family_id,
            latitude: request.latitude,
            longitude: request.longitude,
            accuracy_m: request.accuracy_m,
            speed_kmh: request.speed_kmh,
            heading_deg: request.heading_deg,
            altitude_m: request.altitude_m,
            battery_level: request.battery_level,
            is_moving: request.moving(),
            source: request.source.clone(),
        })
        .await?;

    // The sample is already stored; nothing past this point may turn
    // the response into an error.
    let geofence = GeofenceEvaluator::new(state.pool.clone(), state.dispatcher.clone());
    log_enrichment_error(
        "geofence",
        caller.user_id,
        geofence
            .evaluate(
                caller.user_id,
                caller.family_id,
                stored.latitude,
                stored.longitude,
                stored.created_at,
            )
            .await,
    );

    let battery = BatteryMonitor::new(
        state.pool.clone(),
        state.dispatcher.clone(),
        state.config.tracking.low_battery_threshold,
        state.config.tracking.battery_alert_window_secs,
    );
    log_enrichment_error(
        "battery",
        caller.user_id,
        battery
            .check(
                caller.user_id,
                caller.family_id,
                stored.battery_level,
                stored.created_at,
            )
            .await,
    );

    // Pruning happens off the request path; a failed prune is retried by
    // the next accepted sample anyway.
    let keep = state.config.tracking.history_keep_samples;
    let prune_pool = state.pool.clone();
    let prune_user = caller.user_id;
    tokio::spawn(async move {
        let repo = LocationRepository::new(prune_pool);
        match repo.prune_history(prune_user, keep).await {
            Ok(0) => {}
            Ok(removed) => {
                tracing::debug!(user_id = %prune_user, removed, "Pruned location history");
            }
            Err(err) => {
                tracing::warn!(user_id = %prune_user, error = %err, "History prune failed");
            }
        }
    });

    Ok(respond(
        &caller,
        IngestLocationResponse {
            success: true,
            location_id: stored.id,
            device_id: device.device_uuid,
            timestamp: stored.created_at,
            rate_limited: false,
        },
    ))
}

fn respond(caller: &Caller, body: IngestLocationResponse) -> impl IntoResponse {
    (
        AppendHeaders([("x-auth-method", caller.method.as_str())]),
        Json(body),
    )
}

/// Whether a submission at `now` falls inside the minimum spacing
/// window after the newest stored sample. An age exactly equal to the
/// spacing is accepted.
fn inside_spacing_window(
    previous_at: DateTime<Utc>,
    now: DateTime<Utc>,
    spacing_secs: i64,
) -> bool {
    (now - previous_at).num_seconds() < spacing_secs
}

/// Post-insert enrichment stages log their failures and yield nothing.
fn log_enrichment_error<T>(
    stage: &str,
    user_id: Uuid,
    result: Result<T, sqlx::Error>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                stage,
                user_id = %user_id,
                error = %err,
                "Post-insert enrichment failed"
            );
            None
        }
    }
}

/// `GET /api/v1/locations/current`. One row per family member with
/// their newest sample and a derived presence status.
pub async fn current_locations(
    State(state): State<AppState>,
    caller: Option<Extension<Caller>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<CurrentLocationsResponse>, ApiError> {
    let caller = auth::resolve_caller(
        &state.pool,
        caller.map(|Extension(c)| c),
        &headers,
        &jar,
        &state.config.security.session_cookie,
        None,
    )
    .await?;

    let locations = LocationRepository::new(state.pool.clone());
    let settings = SettingsRepository::new(state.pool.clone());

    let rows = locations.latest_per_member(caller.family_id).await?;
    let user_ids: Vec<_> = rows.iter().map(|r| r.user_id).collect();
    let settings_rows = settings.find_for_users(&user_ids).await?;

    let now = Utc::now();
    let members = rows
        .into_iter()
        .map(|row| {
            let interval = settings_rows
                .iter()
                .find(|s| s.user_id == row.user_id)
                .map(|s| s.update_interval_secs)
                .unwrap_or_else(|| TrackingSettings::defaults(row.user_id).update_interval_secs);
            let age = row.reported_at.map(|at| (now - at).num_seconds().max(0));
            MemberPresence {
                user_id: row.user_id,
                display_name: row.display_name,
                status: PresenceStatus::derive(age, interval),
                latitude: row.latitude,
                longitude: row.longitude,
                battery_level: row.battery_level,
                reported_at: row.reported_at,
                device_uuid: row.device_uuid,
                platform: row.platform,
                source: row.source,
            }
        })
        .collect();

    Ok(Json(CurrentLocationsResponse { members }))
}
