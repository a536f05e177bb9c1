//! Tracking event repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TrackingEventEntity;
use crate::metrics::QueryTimer;
use domain::models::TrackingEventType;

/// Input for appending a tracking event.
#[derive(Debug, Clone)]
pub struct TrackingEventInput {
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub event_type: TrackingEventType,
    pub zone_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payload: Option<serde_json::Value>,
}

/// Repository for the append-only tracking_events table.
#[derive(Clone)]
pub struct TrackingEventRepository {
    pool: PgPool,
}

impl TrackingEventRepository {
    /// Creates a new TrackingEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an event.
    pub async fn append(
        &self,
        input: TrackingEventInput,
    ) -> Result<TrackingEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("append_tracking_event");
        let result = sqlx::query_as::<_, TrackingEventEntity>(
            r#"
            INSERT INTO tracking_events (user_id, family_id, event_type, zone_id,
                                         latitude, longitude, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.family_id)
        .bind(input.event_type.as_str())
        .bind(input.zone_id)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.payload)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent enter/exit event for a (user, zone) pair. This is the
    /// containment memory for geofence evaluation; no separate boolean
    /// state exists.
    pub async fn last_zone_transition(
        &self,
        user_id: Uuid,
        zone_id: Uuid,
    ) -> Result<Option<TrackingEventType>, sqlx::Error> {
        let timer = QueryTimer::new("last_zone_transition");
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT event_type FROM tracking_events
            WHERE user_id = $1 AND zone_id = $2
              AND event_type IN ('enter_zone', 'exit_zone')
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();
        Ok(row.and_then(|(s,)| TrackingEventType::from_str(&s)))
    }

    /// Whether an event of the given type exists for the user at or
    /// after `since`. Used to suppress repeated battery-low alerts.
    pub async fn exists_since(
        &self,
        user_id: Uuid,
        event_type: TrackingEventType,
        since: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("tracking_event_exists_since");
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tracking_events
                WHERE user_id = $1 AND event_type = $2 AND created_at >= $3
            )
            "#,
        )
        .bind(user_id)
        .bind(event_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(row.0)
    }

    /// Newest events for a family, newest first.
    pub async fn list_for_family(
        &self,
        family_id: Uuid,
        limit: i64,
    ) -> Result<Vec<TrackingEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tracking_events");
        let result = sqlx::query_as::<_, TrackingEventEntity>(
            r#"
            SELECT * FROM tracking_events
            WHERE family_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(family_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
