//! Geofence evaluation against active zones.
//!
//! Containment state is event-sourced: a user is "inside" a zone iff
//! the most recent enter/exit event for that (user, zone) pair is an
//! enter. Each accepted sample is checked against every active zone of
//! the family and transitions produce a notification followed by an
//! appended event, in that order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{TrackingEventType, Zone};
use domain::services::{NotificationDispatcher, NotificationResult, TrackingNotification};
use persistence::repositories::{TrackingEventInput, TrackingEventRepository, ZoneRepository};

/// Decide which transition, if any, a sample produces for one zone.
///
/// A user with no prior transition history is treated as outside, so
/// the first sample inside a zone produces an enter event.
fn transition(
    last: Option<TrackingEventType>,
    inside: bool,
) -> Option<TrackingEventType> {
    let was_inside = matches!(last, Some(TrackingEventType::EnterZone));
    match (was_inside, inside) {
        (false, true) => Some(TrackingEventType::EnterZone),
        (true, false) => Some(TrackingEventType::ExitZone),
        _ => None,
    }
}

/// Evaluates accepted samples against the family's active zones.
pub struct GeofenceEvaluator {
    zones: ZoneRepository,
    events: TrackingEventRepository,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl GeofenceEvaluator {
    pub fn new(pool: PgPool, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            zones: ZoneRepository::new(pool.clone()),
            events: TrackingEventRepository::new(pool),
            dispatcher,
        }
    }

    /// Evaluate one accepted sample. Returns the transitions recorded.
    ///
    /// Zones are evaluated in creation order. For each transition the
    /// notification is dispatched before the event is appended; a
    /// failed dispatch is logged and does not block the append.
    pub async fn evaluate(
        &self,
        user_id: Uuid,
        family_id: Uuid,
        latitude: f64,
        longitude: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, TrackingEventType)>, sqlx::Error> {
        let zone_rows = self.zones.active_for_family(family_id).await?;
        let mut transitions = Vec::new();

        for row in zone_rows {
            let Some(zone) = row.into_zone() else {
                continue;
            };
            let inside = zone.contains(latitude, longitude);
            let last = self.events.last_zone_transition(user_id, zone.id).await?;
            let Some(event_type) = transition(last, inside) else {
                continue;
            };

            self.notify(&zone, user_id, family_id, event_type, observed_at)
                .await;

            self.events
                .append(TrackingEventInput {
                    user_id,
                    family_id,
                    event_type,
                    zone_id: Some(zone.id),
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    payload: None,
                })
                .await?;

            tracing::info!(
                user_id = %user_id,
                zone_id = %zone.id,
                zone_name = %zone.name,
                event_type = event_type.as_str(),
                "Zone transition recorded"
            );
            transitions.push((zone.id, event_type));
        }

        Ok(transitions)
    }

    async fn notify(
        &self,
        zone: &Zone,
        user_id: Uuid,
        family_id: Uuid,
        event_type: TrackingEventType,
        timestamp: DateTime<Utc>,
    ) {
        let result = self
            .dispatcher
            .dispatch(TrackingNotification {
                family_id,
                user_id,
                event_type,
                zone_id: Some(zone.id),
                zone_name: Some(zone.name.clone()),
                battery_level: None,
                timestamp,
            })
            .await;
        if let NotificationResult::Failed(reason) = result {
            tracing::warn!(
                user_id = %user_id,
                zone_id = %zone.id,
                reason = %reason,
                "Zone transition notification failed"
            );
        }
    }
}
