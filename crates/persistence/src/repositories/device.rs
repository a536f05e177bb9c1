//! Device repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceEntity;
use crate::metrics::QueryTimer;

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a device on its first report and refreshes last_seen_at
    /// (and any newly supplied registration fields) on every later one.
    pub async fn upsert_on_report(
        &self,
        device_uuid: Uuid,
        user_id: Uuid,
        platform: Option<&str>,
        device_name: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<DeviceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_device_on_report");
        let result = sqlx::query_as::<_, DeviceEntity>(
            r#"
            INSERT INTO devices (device_uuid, user_id, platform, device_name, last_seen_at)
            VALUES ($1, $2, COALESCE($3, 'unknown'), $4, $5)
            ON CONFLICT (device_uuid) DO UPDATE SET
                platform = COALESCE($3, devices.platform),
                device_name = COALESCE($4, devices.device_name),
                last_seen_at = $5
            RETURNING *
            "#,
        )
        .bind(device_uuid)
        .bind(user_id)
        .bind(platform)
        .bind(device_name)
        .bind(seen_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a device by its stable UUID.
    pub async fn find_by_uuid(
        &self,
        device_uuid: Uuid,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_uuid");
        let result = sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT * FROM devices WHERE device_uuid = $1
            "#,
        )
        .bind(device_uuid)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
