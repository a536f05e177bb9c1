//! Location repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{LocationEntity, MemberLatestRow};
use crate::metrics::QueryTimer;

/// Input for inserting a location sample.
#[derive(Debug, Clone)]
pub struct LocationInput {
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
}

/// Repository for location-related database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a location sample.
    pub async fn insert(&self, input: LocationInput) -> Result<LocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (device_id, user_id, family_id, latitude, longitude,
                                   accuracy_m, speed_kmh, heading_deg, altitude_m,
                                   battery_level, is_moving, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(input.device_id)
        .bind(input.user_id)
        .bind(input.family_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.accuracy_m)
        .bind(input.speed_kmh)
        .bind(input.heading_deg)
        .bind(input.altitude_m)
        .bind(input.battery_level)
        .bind(input.is_moving)
        .bind(input.source)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Newest stored sample for a (user, device) pair; the dedup check
    /// compares its age against the minimum spacing.
    pub async fn latest_for_device(
        &self,
        user_id: Uuid,
        device_id: i64,
    ) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_location_for_device");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT * FROM locations
            WHERE user_id = $1 AND device_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One row per family member with their newest sample, if any, and
    /// the device that reported it.
    pub async fn latest_per_member(
        &self,
        family_id: Uuid,
    ) -> Result<Vec<MemberLatestRow>, sqlx::Error> {
        let timer = QueryTimer::new("latest_location_per_member");
        let result = sqlx::query_as::<_, MemberLatestRow>(
            r#"
            SELECT u.id AS user_id,
                   u.display_name,
                   l.latitude,
                   l.longitude,
                   l.battery_level,
                   l.source,
                   l.created_at AS reported_at,
                   d.device_uuid,
                   d.platform
            FROM users u
            LEFT JOIN LATERAL (
                SELECT * FROM locations
                WHERE user_id = u.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) l ON TRUE
            LEFT JOIN devices d ON d.id = l.device_id
            WHERE u.family_id = $1
            ORDER BY u.display_name
            "#,
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes everything outside the most-recent-`keep` window for the
    /// user. Returns the number of rows removed.
    pub async fn prune_history(&self, user_id: Uuid, keep: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("prune_location_history");
        let result = sqlx::query(
            r#"
            WITH keepers AS (
                SELECT id FROM locations
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            )
            DELETE FROM locations
            WHERE user_id = $1 AND id NOT IN (SELECT id FROM keepers)
            "#,
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_input_carries_optional_fields() {
        let input = LocationInput {
            device_id: 1,
            user_id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            latitude: 48.0,
            longitude: 17.0,
            accuracy_m: None,
            speed_kmh: Some(4.5),
            heading_deg: None,
            altitude_m: None,
            battery_level: Some(80),
            is_moving: true,
            source: Some("gps".to_string()),
        };
        assert!(input.accuracy_m.is_none());
        assert!(input.is_moving);
    }
}
