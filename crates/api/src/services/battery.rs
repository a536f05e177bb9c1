//! Low-battery alerting with a per-user suppression window.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::TrackingEventType;
use domain::services::{NotificationDispatcher, NotificationResult, TrackingNotification};
use persistence::repositories::{TrackingEventInput, TrackingEventRepository};

/// Decide whether a reported level should raise an alert, given the
/// configured threshold and whether one fired inside the window.
fn should_alert(battery_level: Option<i32>, threshold: i32, alerted_recently: bool) -> bool {
    match battery_level {
        Some(level) => level <= threshold && !alerted_recently,
        None => false,
    }
}

/// Emits battery_low events when a sample reports a level at or below
/// the configured threshold, at most once per suppression window.
pub struct BatteryMonitor {
    events: TrackingEventRepository,
    dispatcher: Arc<dyn NotificationDispatcher>,
    threshold: i32,
    window_secs: i64,
}

impl BatteryMonitor {
    pub fn new(
        pool: PgPool,
        dispatcher: Arc<dyn NotificationDispatcher>,
        threshold: i32,
        window_secs: i64,
    ) -> Self {
        Self {
            events: TrackingEventRepository::new(pool),
            dispatcher,
            threshold,
            window_secs,
        }
    }

    /// Check one accepted sample. Returns true when an alert was raised.
    pub async fn check(
        &self,
        user_id: Uuid,
        family_id: Uuid,
        battery_level: Option<i32>,
        observed_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let Some(level) = battery_level else {
            return Ok(false);
        };
        if level > self.threshold {
            return Ok(false);
        }

        let since = observed_at - Duration::seconds(self.window_secs);
        let alerted_recently = self
            .events
            .exists_since(user_id, TrackingEventType::BatteryLow, since)
            .await?;
        if !should_alert(Some(level), self.threshold, alerted_recently) {
            return Ok(false);
        }

        let result = self
            .dispatcher
            .dispatch(TrackingNotification {
                family_id,
                user_id,
                event_type: TrackingEventType::BatteryLow,
                zone_id: None,
                zone_name: None,
                battery_level: Some(level),
                timestamp: observed_at,
            })
            .await;
        if let NotificationResult::Failed(reason) = result {
            tracing::warn!(
                user_id = %user_id,
                reason = %reason,
                "Battery notification failed"
            );
        }

        self.events
            .append(TrackingEventInput {
                user_id,
                family_id,
                event_type: TrackingEventType::BatteryLow,
                zone_id: None,
                latitude: None,
                longitude: None,
                payload: Some(serde_json::json!({ "battery_level": level })),
            })
            .await?;

        tracing::info!(user_id = %user_id, level, "Battery low alert raised");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_at_threshold() {
        assert!(should_alert(Some(15), 15, false));
    }

    #[test]
    fn test_no_alert_above_threshold() {
        assert!(!should_alert(Some(16), 15, false));
    }

    #[test]
    fn test_suppressed_inside_window() {
        assert!(!should_alert(Some(5), 15, true));
    }

    #[test]
    fn test_no_alert_without_reading() {
        assert!(!should_alert(None, 15, false));
    }
}
