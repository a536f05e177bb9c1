//! Notification dispatch seam.
//!
//! The ingestion pipeline emits semantic events (zone enter/exit, low
//! battery, SOS); delivery is fire-and-forget and owned by an external
//! push service behind this trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TrackingEventType;

/// A semantic notification handed to the delivery transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingNotification {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub event_type: TrackingEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone)]
pub enum NotificationResult {
    /// Handed to the transport successfully.
    Dispatched,
    /// Delivery failed; the caller logs and moves on.
    Failed(String),
}

/// Dispatch seam for the external push-notification service.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: TrackingNotification) -> NotificationResult;
}

/// Mock dispatcher for development and testing. Logs instead of sending.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationDispatcher {
    /// Whether to simulate delivery failures for testing.
    pub simulate_failure: bool,
}

impl MockNotificationDispatcher {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn dispatch(&self, notification: TrackingNotification) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                user_id = %notification.user_id,
                event_type = notification.event_type.as_str(),
                "Mock dispatcher simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            user_id = %notification.user_id,
            family_id = %notification.family_id,
            event_type = notification.event_type.as_str(),
            zone_id = ?notification.zone_id,
            "Mock: would dispatch notification"
        );
        NotificationResult::Dispatched
    }
}
