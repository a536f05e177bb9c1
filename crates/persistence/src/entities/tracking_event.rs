//! Tracking event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{TrackingEvent, TrackingEventType};

/// Database row mapping for the tracking_events table.
#[derive(Debug, Clone, FromRow)]
pub struct TrackingEventEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub event_type: String,
    pub zone_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TrackingEventEntity {
    /// Converts the row into a domain event; rows with an unknown
    /// event_type string yield None.
    pub fn into_event(self) -> Option<TrackingEvent> {
        let event_type = TrackingEventType::from_str(&self.event_type)?;
        Some(TrackingEvent {
            id: self.id,
            user_id: self.user_id,
            family_id: self.family_id,
            event_type,
            zone_id: self.zone_id,
            latitude: self.latitude,
            longitude: self.longitude,
            payload: self.payload,
            created_at: self.created_at,
        })
    }
}
