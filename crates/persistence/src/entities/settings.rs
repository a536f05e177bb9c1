//! Tracking settings entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the tracking_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct TrackingSettingsEntity {
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

impl From<TrackingSettingsEntity> for domain::models::TrackingSettings {
    fn from(entity: TrackingSettingsEntity) -> Self {
        Self {
            user_id: entity.user_id,
            update_interval_secs: entity.update_interval_secs,
            retention_days: entity.retention_days,
            tracking_enabled: entity.tracking_enabled,
            high_accuracy: entity.high_accuracy,
            background_tracking: entity.background_tracking,
            show_speed: entity.show_speed,
            show_battery: entity.show_battery,
            show_accuracy: entity.show_accuracy,
            idle_heartbeat_secs: entity.idle_heartbeat_secs,
            offline_threshold_secs: entity.offline_threshold_secs,
            stale_threshold_secs: entity.stale_threshold_secs,
            updated_at: entity.updated_at,
        }
    }
}
