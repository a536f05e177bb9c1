//! Per-sample upload decision.

use std::time::Duration;

use crate::config::TrackingConfig;
use crate::mode::TrackingMode;

/// Why a sample is being uploaded; carried as the `source` tag so the
/// server can tell heartbeats from live tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReason {
    Live,
    Movement,
    Interval,
    Heartbeat,
}

impl UploadReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadReason::Live => "live",
            UploadReason::Movement => "gps",
            UploadReason::Interval => "interval",
            UploadReason::Heartbeat => "heartbeat",
        }
    }
}

/// Decides whether one sample should be transmitted.
///
/// LIVE and MOVING upload every sample their clocks produce; the pacing
/// lives in the sample clock, not here. IDLE only lets a sample through
/// once the heartbeat interval has passed since the last success.
pub fn should_upload(
    mode: TrackingMode,
    moving: bool,
    since_last_upload: Option<Duration>,
    config: &TrackingConfig,
) -> Option<UploadReason> {
    match mode {
        TrackingMode::Live => Some(UploadReason::Live),
        TrackingMode::Moving => {
            if moving {
                Some(UploadReason::Movement)
            } else {
                Some(UploadReason::Interval)
            }
        }
        TrackingMode::Idle => {
            let due = match since_last_upload {
                Some(age) => age >= config.idle_heartbeat,
                // Nothing uploaded yet this run.
                None => true,
            };
            if due {
                Some(UploadReason::Heartbeat)
            } else {
                None
            }
        }
    }
}
