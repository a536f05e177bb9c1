//! Zone repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ZoneEntity;
use crate::metrics::QueryTimer;

/// Repository for zone-related database operations.
#[derive(Clone)]
pub struct ZoneRepository {
    pool: PgPool,
}

impl ZoneRepository {
    /// Creates a new ZoneRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All active zones for a family, oldest first so evaluation order
    /// is stable.
    pub async fn active_for_family(
        &self,
        family_id: Uuid,
    ) -> Result<Vec<ZoneEntity>, sqlx::Error> {
        let timer = QueryTimer::new("active_zones_for_family");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM zones
            WHERE family_id = $1 AND active = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a zone by id.
    pub async fn find_by_id(&self, zone_id: Uuid) -> Result<Option<ZoneEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_zone_by_id");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM zones WHERE id = $1
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
