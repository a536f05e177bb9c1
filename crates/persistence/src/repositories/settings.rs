//! Tracking settings repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TrackingSettingsEntity;
use crate::metrics::QueryTimer;
use domain::models::TrackingSettings;

/// Repository for per-user tracking settings.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Settings row for a user, if one was ever written.
    pub async fn find(
        &self,
        user_id: Uuid,
    ) -> Result<Option<TrackingSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_tracking_settings");
        let result = sqlx::query_as::<_, TrackingSettingsEntity>(
            r#"
            SELECT * FROM tracking_settings WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Settings rows for a set of users (one round trip for the
    /// presence query).
    pub async fn find_for_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<TrackingSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_tracking_settings_many");
        let result = sqlx::query_as::<_, TrackingSettingsEntity>(
            r#"
            SELECT * FROM tracking_settings WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upsert the full settings row for a user.
    pub async fn upsert(
        &self,
        settings: &TrackingSettings,
    ) -> Result<TrackingSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_tracking_settings");
        let result = sqlx::query_as::<_, TrackingSettingsEntity>(
            r#"
            INSERT INTO tracking_settings (user_id, update_interval_secs, retention_days,
                                           tracking_enabled, high_accuracy, background_tracking,
                                           show_speed, show_battery, show_accuracy,
                                           idle_heartbeat_secs, offline_threshold_secs,
                                           stale_threshold_secs, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                update_interval_secs = EXCLUDED.update_interval_secs,
                retention_days = EXCLUDED.retention_days,
                tracking_enabled = EXCLUDED.tracking_enabled,
                high_accuracy = EXCLUDED.high_accuracy,
                background_tracking = EXCLUDED.background_tracking,
                show_speed = EXCLUDED.show_speed,
                show_battery = EXCLUDED.show_battery,
                show_accuracy = EXCLUDED.show_accuracy,
                idle_heartbeat_secs = EXCLUDED.idle_heartbeat_secs,
                offline_threshold_secs = EXCLUDED.offline_threshold_secs,
                stale_threshold_secs = EXCLUDED.stale_threshold_secs,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(settings.user_id)
        .bind(settings.update_interval_secs)
        .bind(settings.retention_days)
        .bind(settings.tracking_enabled)
        .bind(settings.high_accuracy)
        .bind(settings.background_tracking)
        .bind(settings.show_speed)
        .bind(settings.show_battery)
        .bind(settings.show_accuracy)
        .bind(settings.idle_heartbeat_secs)
        .bind(settings.offline_threshold_secs)
        .bind(settings.stale_threshold_secs)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
