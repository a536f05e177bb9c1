//! Per-user tracking settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_UPDATE_INTERVAL_SECS: i32 = 5;
pub const MAX_UPDATE_INTERVAL_SECS: i32 = 300;
pub const MIN_RETENTION_DAYS: i32 = 1;
pub const MAX_RETENTION_DAYS: i32 = 365;
pub const MIN_IDLE_HEARTBEAT_SECS: i32 = 60;
/// Upper cap shared by all three ordered thresholds.
pub const MAX_THRESHOLD_SECS: i32 = 86_400;

/// Per-user configuration; defaults apply when no row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSettings {
    pub user_id: Uuid,
    pub update_interval_secs: i32,
    pub retention_days: i32,
    pub tracking_enabled: bool,
    pub high_accuracy: bool,
    pub background_tracking: bool,
    pub show_speed: bool,
    pub show_battery: bool,
    pub show_accuracy: bool,
    pub idle_heartbeat_secs: i32,
    pub offline_threshold_secs: i32,
    pub stale_threshold_secs: i32,
    pub updated_at: DateTime<Utc>,
}

impl TrackingSettings {
    pub fn defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            update_interval_secs: 60,
            retention_days: 30,
            tracking_enabled: true,
            high_accuracy: false,
            background_tracking: true,
            show_speed: true,
            show_battery: true,
            show_accuracy: false,
            idle_heartbeat_secs: 600,
            offline_threshold_secs: 1800,
            stale_threshold_secs: 3600,
            updated_at: Utc::now(),
        }
    }
}

/// Request body for `PUT /api/v1/settings`; all fields optional,
/// omitted fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub update_interval_secs: Option<i32>,
    pub retention_days: Option<i32>,
    pub tracking_enabled: Option<bool>,
    pub high_accuracy: Option<bool>,
    pub background_tracking: Option<bool>,
    pub show_speed: Option<bool>,
    pub show_battery: Option<bool>,
    pub show_accuracy: Option<bool>,
    pub idle_heartbeat_secs: Option<i32>,
    pub offline_threshold_secs: Option<i32>,
    pub stale_threshold_secs: Option<i32>,
}

/// Errors from applying a settings update.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("offline threshold must be >= idle heartbeat ({idle_heartbeat}s)")]
    OfflineBelowHeartbeat { idle_heartbeat: i32 },

    #[error("stale threshold must be >= offline threshold ({offline}s)")]
    StaleBelowOffline { offline: i32 },
}

impl UpdateSettingsRequest {
    /// Applies this update on top of `current`, clamping the numeric
    /// ranges and enforcing idle-heartbeat <= offline <= stale, in that
    /// order, against the post-clamp values.
    pub fn apply(&self, current: &TrackingSettings) -> Result<TrackingSettings, SettingsError> {
        let mut next = current.clone();

        if let Some(v) = self.update_interval_secs {
            next.update_interval_secs = v.clamp(MIN_UPDATE_INTERVAL_SECS, MAX_UPDATE_INTERVAL_SECS);
        }
        if let Some(v) = self.retention_days {
            next.retention_days = v.clamp(MIN_RETENTION_DAYS, MAX_RETENTION_DAYS);
        }
        if let Some(v) = self.tracking_enabled {
            next.tracking_enabled = v;
        }
        if let Some(v) = self.high_accuracy {
            next.high_accuracy = v;
        }
        if let Some(v) = self.background_tracking {
            next.background_tracking = v;
        }
        if let Some(v) = self.show_speed {
            next.show_speed = v;
        }
        if let Some(v) = self.show_battery {
            next.show_battery = v;
        }
        if let Some(v) = self.show_accuracy {
            next.show_accuracy = v;
        }
        if let Some(v) = self.idle_heartbeat_secs {
            next.idle_heartbeat_secs = v.clamp(MIN_IDLE_HEARTBEAT_SECS, MAX_THRESHOLD_SECS);
        }
        if let Some(v) = self.offline_threshold_secs {
            next.offline_threshold_secs = v.clamp(MIN_IDLE_HEARTBEAT_SECS, MAX_THRESHOLD_SECS);
        }
        if let Some(v) = self.stale_threshold_secs {
            next.stale_threshold_secs = v.clamp(MIN_IDLE_HEARTBEAT_SECS, MAX_THRESHOLD_SECS);
        }

        if next.offline_threshold_secs < next.idle_heartbeat_secs {
            return Err(SettingsError::OfflineBelowHeartbeat {
                idle_heartbeat: next.idle_heartbeat_secs,
            });
        }
        if next.stale_threshold_secs < next.offline_threshold_secs {
            return Err(SettingsError::StaleBelowOffline {
                offline: next.offline_threshold_secs,
            });
        }

        next.updated_at = Utc::now();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_internally_consistent() {
        let s = TrackingSettings::defaults(Uuid::new_v4());
        assert!(s.idle_heartbeat_secs >= MIN_IDLE_HEARTBEAT_SECS);
        assert!(s.offline_threshold_secs >= s.idle_heartbeat_secs);
        assert!(s.stale_threshold_secs >= s.offline_threshold_secs);
    }

    #[test]
    fn test_update_interval_clamped() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            update_interval_secs: Some(1),
            ..Default::default()
        };
        assert_eq!(req.apply(&current).unwrap().update_interval_secs, 5);

        let req = UpdateSettingsRequest {
            update_interval_secs: Some(9999),
            ..Default::default()
        };
        assert_eq!(req.apply(&current).unwrap().update_interval_secs, 300);
    }

    #[test]
    fn test_retention_clamped() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            retention_days: Some(0),
            ..Default::default()
        };
        assert_eq!(req.apply(&current).unwrap().retention_days, 1);

        let req = UpdateSettingsRequest {
            retention_days: Some(1000),
            ..Default::default()
        };
        assert_eq!(req.apply(&current).unwrap().retention_days, 365);
    }

    #[test]
    fn test_threshold_order_enforced() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            idle_heartbeat_secs: Some(1200),
            offline_threshold_secs: Some(900),
            ..Default::default()
        };
        assert_eq!(
            req.apply(&current),
            Err(SettingsError::OfflineBelowHeartbeat {
                idle_heartbeat: 1200
            })
        );

        let req = UpdateSettingsRequest {
            stale_threshold_secs: Some(600),
            ..Default::default()
        };
        assert_eq!(
            req.apply(&current),
            Err(SettingsError::StaleBelowOffline { offline: 1800 })
        );
    }

    #[test]
    fn test_thresholds_capped_at_24h() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            idle_heartbeat_secs: Some(999_999),
            offline_threshold_secs: Some(999_999),
            stale_threshold_secs: Some(999_999),
            ..Default::default()
        };
        let next = req.apply(&current).unwrap();
        assert_eq!(next.idle_heartbeat_secs, MAX_THRESHOLD_SECS);
        assert_eq!(next.offline_threshold_secs, MAX_THRESHOLD_SECS);
        assert_eq!(next.stale_threshold_secs, MAX_THRESHOLD_SECS);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            high_accuracy: Some(true),
            ..Default::default()
        };
        let next = req.apply(&current).unwrap();
        assert!(next.high_accuracy);
        assert_eq!(next.update_interval_secs, current.update_interval_secs);
        assert_eq!(next.retention_days, current.retention_days);
    }

    #[test]
    fn test_heartbeat_floor_is_60s() {
        let current = TrackingSettings::defaults(Uuid::new_v4());
        let req = UpdateSettingsRequest {
            idle_heartbeat_secs: Some(10),
            ..Default::default()
        };
        assert_eq!(req.apply(&current).unwrap().idle_heartbeat_secs, 60);
    }
}
