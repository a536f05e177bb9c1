//! Derived presence status for the current-locations query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Floor for the online cutoff so short update intervals do not flap.
pub const MIN_ONLINE_CUTOFF_SECS: i64 = 300;
/// Fixed boundary between stale and offline.
pub const STALE_CUTOFF_SECS: i64 = 3600;

/// Derived liveness of a family member's last report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Stale,
    Offline,
    NoLocation,
}

impl PresenceStatus {
    /// Derives status from seconds since the last report and the user's
    /// update interval. `None` means no sample was ever stored.
    pub fn derive(seconds_since_report: Option<i64>, update_interval_secs: i32) -> Self {
        let Some(age) = seconds_since_report else {
            return PresenceStatus::NoLocation;
        };
        let online_cutoff = (2 * update_interval_secs as i64).max(MIN_ONLINE_CUTOFF_SECS);
        if age <= online_cutoff {
            PresenceStatus::Online
        } else if age <= STALE_CUTOFF_SECS {
            PresenceStatus::Stale
        } else {
            PresenceStatus::Offline
        }
    }
}

/// One family member row in the current-locations response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPresence {
    pub user_id: Uuid,
    pub display_name: String,
    pub status: PresenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Response body for `GET /api/v1/locations/current`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLocationsResponse {
    pub members: Vec<MemberPresence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sample_is_no_location() {
        assert_eq!(PresenceStatus::derive(None, 60), PresenceStatus::NoLocation);
    }

    #[test]
    fn test_online_uses_floor_for_short_intervals() {
        // 2 x 60s = 120s, but the floor keeps the cutoff at 300s.
        assert_eq!(PresenceStatus::derive(Some(250), 60), PresenceStatus::Online);
        assert_eq!(PresenceStatus::derive(Some(301), 60), PresenceStatus::Stale);
    }

    #[test]
    fn test_online_uses_double_interval_for_long_intervals() {
        // 2 x 300s = 600s cutoff.
        assert_eq!(
            PresenceStatus::derive(Some(550), 300),
            PresenceStatus::Online
        );
        assert_eq!(PresenceStatus::derive(Some(601), 300), PresenceStatus::Stale);
    }

    #[test]
    fn test_stale_to_offline_boundary() {
        assert_eq!(PresenceStatus::derive(Some(3600), 60), PresenceStatus::Stale);
        assert_eq!(
            PresenceStatus::derive(Some(3601), 60),
            PresenceStatus::Offline
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PresenceStatus::NoLocation).unwrap(),
            "\"no_location\""
        );
        assert_eq!(
            serde_json::to_string(&PresenceStatus::Online).unwrap(),
            "\"online\""
        );
    }
}
