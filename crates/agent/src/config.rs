//! Immutable agent configuration snapshot.
//!
//! The worker holds one `Arc<TrackingConfig>` at a time and swaps the
//! whole snapshot when settings change. Nothing in the agent reads
//! settings from shared storage mid-transition.

use std::time::Duration;
use uuid::Uuid;

/// One immutable snapshot of everything the agent needs to run.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Base URL of the ingestion API.
    pub server_url: String,
    /// Stable device identifier, generated once and persisted.
    pub device_uuid: Uuid,
    /// Session token presented as a bearer header on uploads.
    pub session_token: String,

    /// Upload interval while MOVING.
    pub update_interval: Duration,
    /// Upload interval while LIVE.
    pub live_interval: Duration,
    /// Forced liveness sample interval while IDLE.
    pub idle_heartbeat: Duration,

    /// Movement recency window that keeps the agent in MOVING.
    pub moving_window: Duration,
    /// Hard cap on any single wake-lock acquisition.
    pub wake_cap: Duration,
    /// Renewal period for the wake-lock while LIVE persists.
    pub wake_renewal: Duration,

    /// Upload suppression window after an auth or billing rejection.
    pub auth_block: Duration,
    /// Consecutive transient failures that force LIVE down to MOVING.
    pub live_failure_limit: u32,

    /// Distance a fix must move to count as movement.
    pub movement_distance_m: f64,
    /// Reported speed that counts as movement on its own.
    pub movement_speed_ms: f64,

    pub high_accuracy: bool,
}

impl TrackingConfig {
    /// Snapshot with the stock policy values; callers override the
    /// identity and endpoint fields.
    pub fn new(server_url: String, device_uuid: Uuid, session_token: String) -> Self {
        Self {
            server_url,
            device_uuid,
            session_token,
            update_interval: Duration::from_secs(60),
            live_interval: Duration::from_secs(10),
            idle_heartbeat: Duration::from_secs(600),
            moving_window: Duration::from_secs(180),
            wake_cap: Duration::from_secs(120),
            wake_renewal: Duration::from_secs(90),
            auth_block: Duration::from_secs(1800),
            live_failure_limit: 3,
            movement_distance_m: 50.0,
            movement_speed_ms: 1.0,
            high_accuracy: false,
        }
    }

    /// Applies a server-side settings update onto this snapshot,
    /// producing the next snapshot to swap in.
    pub fn with_intervals(
        &self,
        update_interval: Duration,
        idle_heartbeat: Duration,
        high_accuracy: bool,
    ) -> Self {
        let mut next = self.clone();
        next.update_interval = update_interval;
        next.idle_heartbeat = idle_heartbeat;
        next.high_accuracy = high_accuracy;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrackingConfig {
        TrackingConfig::new(
            "https://locator.example.com".into(),
            Uuid::new_v4(),
            "token".into(),
        )
    }

    #[test]
    fn test_stock_policy_values() {
        let c = config();
        assert_eq!(c.update_interval, Duration::from_secs(60));
        assert_eq!(c.live_interval, Duration::from_secs(10));
        assert_eq!(c.idle_heartbeat, Duration::from_secs(600));
        assert_eq!(c.moving_window, Duration::from_secs(180));
        assert_eq!(c.wake_cap, Duration::from_secs(120));
        assert_eq!(c.wake_renewal, Duration::from_secs(90));
        assert_eq!(c.auth_block, Duration::from_secs(1800));
        assert_eq!(c.live_failure_limit, 3);
    }

    #[test]
    fn test_settings_update_produces_new_snapshot() {
        let c = config();
        let next = c.with_intervals(
            Duration::from_secs(30),
            Duration::from_secs(900),
            true,
        );
        assert_eq!(next.update_interval, Duration::from_secs(30));
        assert_eq!(next.idle_heartbeat, Duration::from_secs(900));
        assert!(next.high_accuracy);
        // Original snapshot is untouched.
        assert_eq!(c.update_interval, Duration::from_secs(60));
    }
}
