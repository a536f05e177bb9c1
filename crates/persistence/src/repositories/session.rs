//! Auth session repository for database operations.

use sqlx::PgPool;

use crate::entities::SessionEntity;
use crate::metrics::QueryTimer;

/// Repository for session lookups. Sessions are the single source of
/// truth the auth-resolution chain validates against, whichever
/// transport carried the token.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new SessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a non-expired session by the SHA-256 digest of its token.
    pub async fn find_valid_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_token_hash");
        let result = sqlx::query_as::<_, SessionEntity>(
            r#"
            SELECT * FROM sessions
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
