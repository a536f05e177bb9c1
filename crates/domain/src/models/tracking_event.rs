//! Tracking event domain model.
//!
//! Events are append-only. For a (user, zone) pair the most recent
//! enter/exit event doubles as the containment memory for geofence
//! evaluation, so consecutive events for a pair must alternate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The fixed set of event types the pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEventType {
    EnterZone,
    ExitZone,
    Sos,
    TrackingPaused,
    TrackingResumed,
    LocationStale,
    SpeedAlert,
    BatteryLow,
}

impl TrackingEventType {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingEventType::EnterZone => "enter_zone",
            TrackingEventType::ExitZone => "exit_zone",
            TrackingEventType::Sos => "sos",
            TrackingEventType::TrackingPaused => "tracking_paused",
            TrackingEventType::TrackingResumed => "tracking_resumed",
            TrackingEventType::LocationStale => "location_stale",
            TrackingEventType::SpeedAlert => "speed_alert",
            TrackingEventType::BatteryLow => "battery_low",
        }
    }

    /// Parses from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "enter_zone" => Some(TrackingEventType::EnterZone),
            "exit_zone" => Some(TrackingEventType::ExitZone),
            "sos" => Some(TrackingEventType::Sos),
            "tracking_paused" => Some(TrackingEventType::TrackingPaused),
            "tracking_resumed" => Some(TrackingEventType::TrackingResumed),
            "location_stale" => Some(TrackingEventType::LocationStale),
            "speed_alert" => Some(TrackingEventType::SpeedAlert),
            "battery_low" => Some(TrackingEventType::BatteryLow),
            _ => None,
        }
    }

    /// Whether this event type carries zone containment semantics.
    pub fn is_zone_transition(&self) -> bool {
        matches!(
            self,
            TrackingEventType::EnterZone | TrackingEventType::ExitZone
        )
    }
}

/// An appended tracking event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: i64,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub event_type: TrackingEventType,
    pub zone_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/events`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogEventRequest {
    pub event_type: TrackingEventType,

    pub zone_id: Option<Uuid>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,

    pub payload: Option<serde_json::Value>,

    pub session_token: Option<String>,
}

/// Response body for `POST /api/v1/events`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEventResponse {
    pub success: bool,
    pub event_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [TrackingEventType; 8] = [
        TrackingEventType::EnterZone,
        TrackingEventType::ExitZone,
        TrackingEventType::Sos,
        TrackingEventType::TrackingPaused,
        TrackingEventType::TrackingResumed,
        TrackingEventType::LocationStale,
        TrackingEventType::SpeedAlert,
        TrackingEventType::BatteryLow,
    ];

    #[test]
    fn test_event_type_str_round_trip() {
        for ty in ALL_TYPES {
            assert_eq!(TrackingEventType::from_str(ty.as_str()), Some(ty));
        }
        assert_eq!(TrackingEventType::from_str("bogus"), None);
    }

    #[test]
    fn test_event_type_serde_matches_as_str() {
        for ty in ALL_TYPES {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn test_zone_transition_classification() {
        assert!(TrackingEventType::EnterZone.is_zone_transition());
        assert!(TrackingEventType::ExitZone.is_zone_transition());
        assert!(!TrackingEventType::Sos.is_zone_transition());
        assert!(!TrackingEventType::BatteryLow.is_zone_transition());
    }

    #[test]
    fn test_log_event_request_deserialization() {
        let json = r#"{
            "event_type": "sos",
            "latitude": 48.1,
            "longitude": 17.1,
            "payload": {"note": "manual trigger"}
        }"#;
        let req: LogEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.event_type, TrackingEventType::Sos);
        assert!(req.zone_id.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_log_event_request_rejects_unknown_type() {
        let json = r#"{"event_type": "teleported"}"#;
        assert!(serde_json::from_str::<LogEventRequest>(json).is_err());
    }
}
