//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub family_id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
