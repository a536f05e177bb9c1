//! Tracking mode state machine.
//!
//! Exactly one mode is current at a time. Priority on every re-check:
//! a live-view window still open wins, then movement within the
//! recency window, then idle.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::TrackingConfig;

/// Power/accuracy mode of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    Idle,
    Moving,
    Live,
}

impl TrackingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::Idle => "idle",
            TrackingMode::Moving => "moving",
            TrackingMode::Live => "live",
        }
    }
}

/// Sampling parameters for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleProfile {
    pub interval: Duration,
    pub high_accuracy: bool,
}

/// Owns the inputs that decide the current mode.
#[derive(Debug)]
pub struct ModeController {
    live_until: Option<Instant>,
    last_movement: Option<Instant>,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            live_until: None,
            last_movement: None,
        }
    }

    /// Start state for an agent that observed movement shortly before
    /// launch.
    pub fn with_recent_movement(at: Instant) -> Self {
        Self {
            live_until: None,
            last_movement: Some(at),
        }
    }

    /// A viewer opened the live map; keep LIVE until `until`.
    pub fn request_live(&mut self, until: Instant) {
        self.live_until = Some(until);
    }

    /// Drop out of LIVE immediately (upload failures, viewer closed).
    pub fn clear_live(&mut self) {
        self.live_until = None;
    }

    pub fn note_movement(&mut self, at: Instant) {
        self.last_movement = Some(at);
    }

    pub fn live_until(&self) -> Option<Instant> {
        self.live_until
    }

    /// Resolves the current mode. Total and deterministic: LIVE beats
    /// MOVING beats IDLE, whatever the movement history says.
    pub fn resolve(&self, now: Instant, config: &TrackingConfig) -> TrackingMode {
        if let Some(until) = self.live_until {
            if until > now {
                return TrackingMode::Live;
            }
        }
        if let Some(at) = self.last_movement {
            if now.duration_since(at) < config.moving_window {
                return TrackingMode::Moving;
            }
        }
        TrackingMode::Idle
    }

    /// Sampling parameters for a mode under the given config.
    pub fn profile(mode: TrackingMode, config: &TrackingConfig) -> SampleProfile {
        match mode {
            TrackingMode::Live => SampleProfile {
                interval: config.live_interval,
                high_accuracy: true,
            },
            TrackingMode::Moving => SampleProfile {
                interval: config.update_interval,
                high_accuracy: config.high_accuracy,
            },
            TrackingMode::Idle => SampleProfile {
                interval: config.idle_heartbeat,
                high_accuracy: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn config() -> TrackingConfig {
        TrackingConfig::new("http://localhost".into(), Uuid::new_v4(), "t".into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_agent_is_idle() {
        let controller = ModeController::new();
        assert_eq!(
            controller.resolve(Instant::now(), &config()),
            TrackingMode::Idle
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_movement_starts_moving() {
        let now = Instant::now();
        let controller = ModeController::with_recent_movement(now);
        assert_eq!(controller.resolve(now, &config()), TrackingMode::Moving);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_beats_movement() {
        let config = config();
        let now = Instant::now();
        let mut controller = ModeController::new();
        controller.note_movement(now);
        controller.request_live(now + Duration::from_secs(30));
        assert_eq!(controller.resolve(now, &config), TrackingMode::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_expires_to_moving_then_idle() {
        let config = config();
        let now = Instant::now();
        let mut controller = ModeController::new();
        controller.note_movement(now);
        controller.request_live(now + Duration::from_secs(30));

        let after_live = now + Duration::from_secs(31);
        assert_eq!(controller.resolve(after_live, &config), TrackingMode::Moving);

        let after_window = now + config.moving_window + Duration::from_secs(1);
        assert_eq!(controller.resolve(after_window, &config), TrackingMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_live_drops_out_immediately() {
        let config = config();
        let now = Instant::now();
        let mut controller = ModeController::new();
        controller.request_live(now + Duration::from_secs(300));
        assert_eq!(controller.resolve(now, &config), TrackingMode::Live);

        controller.clear_live();
        assert_eq!(controller.resolve(now, &config), TrackingMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_movement_window_boundary() {
        let config = config();
        let now = Instant::now();
        let mut controller = ModeController::new();
        controller.note_movement(now);

        let inside = now + config.moving_window - Duration::from_secs(1);
        assert_eq!(controller.resolve(inside, &config), TrackingMode::Moving);

        let outside = now + config.moving_window;
        assert_eq!(controller.resolve(outside, &config), TrackingMode::Idle);
    }

    #[test]
    fn test_profiles() {
        let config = config();
        let live = ModeController::profile(TrackingMode::Live, &config);
        assert_eq!(live.interval, config.live_interval);
        assert!(live.high_accuracy);

        let moving = ModeController::profile(TrackingMode::Moving, &config);
        assert_eq!(moving.interval, config.update_interval);

        let idle = ModeController::profile(TrackingMode::Idle, &config);
        assert_eq!(idle.interval, config.idle_heartbeat);
        assert!(!idle.high_accuracy);
    }
}
