//! Location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
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

impl From<LocationEntity> for domain::models::LocationSample {
    fn from(entity: LocationEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            user_id: entity.user_id,
            family_id: entity.family_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy_m: entity.accuracy_m,
            speed_kmh: entity.speed_kmh,
            heading_deg: entity.heading_deg,
            altitude_m: entity.altitude_m,
            battery_level: entity.battery_level,
            is_moving: entity.is_moving,
            source: entity.source,
            created_at: entity.created_at,
        }
    }
}

/// Joined row for the current-locations query: one family member with
/// their newest sample (if any) and the reporting device.
#[derive(Debug, Clone, FromRow)]
pub struct MemberLatestRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub battery_level: Option<i32>,
    pub source: Option<String>,
    pub reported_at: Option<DateTime<Utc>>,
    pub device_uuid: Option<Uuid>,
    pub platform: Option<String>,
}
