//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: i64,
    pub device_uuid: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub device_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            device_uuid: entity.device_uuid,
            user_id: entity.user_id,
            platform: entity.platform,
            device_name: entity.device_name,
            created_at: entity.created_at,
            last_seen_at: entity.last_seen_at,
        }
    }
}
