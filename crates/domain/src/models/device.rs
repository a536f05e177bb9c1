//! Device domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A device known to the tracking pipeline.
///
/// Created on the first report carrying a new UUID, updated on every
/// subsequent report. The tracking pipeline never hard-deletes devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub device_uuid: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub device_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Device {
    /// Seconds elapsed since the device last reported, as of `now`.
    pub fn seconds_since_seen(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_seen_at).num_seconds().max(0)
    }
}
