//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user lookups (family resolution).
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by id.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
