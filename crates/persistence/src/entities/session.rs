//! Auth session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the sessions table. Tokens are stored as
/// SHA-256 digests only.
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
