//! Location sample domain model and ingestion payloads.
//!
//! The ingestion wire format keeps the snake_case field names the
//! device clients already send; viewer-facing DTOs elsewhere use
//! camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// An accepted location sample. Immutable once written; eventually
/// removed by the history pruner when it falls outside the
/// most-recent-N window for its user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub id: i64,
    pub device_id: i64,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
    pub altitude_m: Option<f64>,
    pub battery_level: Option<i32>,
    pub is_moving: bool,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/locations`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestLocationRequest {
    pub device_uuid: Uuid,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy_m: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed_kmh: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_heading"))]
    pub heading_deg: Option<f64>,

    pub altitude_m: Option<f64>,

    /// 0/1 flag from the device-side motion classifier.
    #[serde(default)]
    pub is_moving: u8,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    /// Free-text tag naming the producing subsystem (gps, heartbeat, ...).
    pub source: Option<String>,

    /// Last-resort auth fallback for clients that cannot reliably
    /// deliver headers or cookies.
    pub session_token: Option<String>,

    /// First-seen device registration fields.
    pub platform: Option<String>,
    pub device_name: Option<String>,
}

impl IngestLocationRequest {
    pub fn moving(&self) -> bool {
        self.is_moving != 0
    }
}

/// Response body for `POST /api/v1/locations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestLocationResponse {
    pub success: bool,
    /// Id of the stored sample; on a rate-limited submission this
    /// echoes the previous sample so clients never see an error.
    pub location_id: i64,
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub rate_limited: bool,
}
