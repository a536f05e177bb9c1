//! The agent worker task.
//!
//! One task owns every piece of mutable agent state: the mode
//! controller, the motion classifier, backoff and auth-block, and the
//! wake-lock. Everything else (platform location callbacks, the viewer
//! signal, settings sync) talks to it through the command mailbox, so
//! no state is shared and no lock ordering exists.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::TrackingConfig;
use crate::gate::{self, UploadReason};
use crate::mode::{ModeController, TrackingMode};
use crate::motion::{MotionClassifier, Position};
use crate::reporter::{AuthBlock, Backoff, OutboundSample, UploadOutcome, Uploader};
use crate::wake::WakeLock;

/// One raw fix delivered by the platform location service.
#[derive(Debug, Clone, Copy)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub speed_ms: Option<f64>,
    pub heading_deg: Option<f64>,
    pub altitude_m: Option<f64>,
    pub battery_level: Option<i32>,
}

/// Commands the worker accepts through its mailbox.
#[derive(Debug)]
pub enum AgentCommand {
    /// A fix arrived from the platform.
    Fix(LocationFix),
    /// Activity recognition reported a movement transition.
    ActivityTransition { moving: bool },
    /// A viewer opened the live map; hold LIVE for this long.
    LiveView { duration: Duration },
    /// A spawned upload finished.
    UploadResult(UploadOutcome),
    /// Settings sync produced a new config snapshot.
    SettingsChanged(Arc<TrackingConfig>),
    /// The user revoked location permission.
    PermissionRevoked,
    /// The user turned tracking off.
    Stop,
}

/// The worker asking the platform for a fix (sample clock, live view).
#[derive(Debug, Clone, Copy)]
pub struct FixRequest {
    pub high_accuracy: bool,
}

/// Cheap handle for talking to a running worker.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<AgentCommand>,
    mode: watch::Receiver<TrackingMode>,
}

impl AgentHandle {
    pub async fn send(&self, command: AgentCommand) {
        if self.tx.send(command).await.is_err() {
            tracing::debug!("Agent worker is gone, command dropped");
        }
    }

    pub async fn submit_fix(&self, fix: LocationFix) {
        self.send(AgentCommand::Fix(fix)).await;
    }

    pub async fn live_view(&self, duration: Duration) {
        self.send(AgentCommand::LiveView { duration }).await;
    }

    pub async fn stop(&self) {
        self.send(AgentCommand::Stop).await;
    }

    /// Current mode as last published by the worker.
    pub fn mode(&self) -> TrackingMode {
        *self.mode.borrow()
    }
}

/// Starts the worker task. Returns the handle, the stream of fix
/// requests the platform glue must answer, and the task handle.
pub fn spawn_agent(
    config: Arc<TrackingConfig>,
    uploader: Arc<dyn Uploader>,
    wake: Arc<dyn WakeLock>,
) -> (AgentHandle, mpsc::Receiver<FixRequest>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let (fix_tx, fix_rx) = mpsc::channel(8);
    let (mode_tx, mode_rx) = watch::channel(TrackingMode::Idle);

    let worker = AgentWorker {
        config,
        controller: ModeController::new(),
        classifier: MotionClassifier::new(50.0, 1.0),
        backoff: Backoff::new(),
        auth_block: AuthBlock::new(),
        uploader,
        wake,
        mode: TrackingMode::Idle,
        mode_tx,
        last_upload: None,
        last_attempt: None,
        next_sample: None,
        next_renewal: None,
        permission_granted: true,
        result_tx: tx.clone(),
        fix_tx,
    };

    let join = tokio::spawn(worker.run(rx));

    (
        AgentHandle { tx, mode: mode_rx },
        fix_rx,
        join,
    )
}

struct AgentWorker {
    config: Arc<TrackingConfig>,
    controller: ModeController,
    classifier: MotionClassifier,
    backoff: Backoff,
    auth_block: AuthBlock,
    uploader: Arc<dyn Uploader>,
    wake: Arc<dyn WakeLock>,
    mode: TrackingMode,
    mode_tx: watch::Sender<TrackingMode>,
    /// Stamped on accepted uploads only; failed attempts do not count
    /// against the idle heartbeat.
    last_upload: Option<Instant>,
    last_attempt: Option<Instant>,
    /// Next tick of the per-mode sample clock.
    next_sample: Option<Instant>,
    next_renewal: Option<Instant>,
    permission_granted: bool,
    result_tx: mpsc::Sender<AgentCommand>,
    fix_tx: mpsc::Sender<FixRequest>,
}

/// Sleeps until an optional deadline; pends forever when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

impl AgentWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<AgentCommand>) {
        // The sample clock runs from startup even before any fix.
        self.rearm_sample_clock(Instant::now());

        loop {
            tokio::select! {
                command = rx.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command).await {
                        break;
                    }
                }
                _ = sleep_until_opt(self.next_sample) => {
                    self.sample_tick();
                }
                _ = sleep_until_opt(self.next_renewal) => {
                    self.renew_wake_lock();
                }
            }
        }

        // Whatever ended the loop, never leave the lock held.
        self.wake.release();
    }

    /// Returns false when the worker should shut down.
    async fn handle(&mut self, command: AgentCommand) -> bool {
        let now = Instant::now();
        match command {
            AgentCommand::Fix(fix) => {
                self.on_fix(fix, now).await;
            }
            AgentCommand::ActivityTransition { moving } => {
                self.classifier.activity_transition(moving);
                if moving {
                    self.controller.note_movement(now);
                }
                self.apply_mode(now);
            }
            AgentCommand::LiveView { duration } => {
                self.controller.request_live(now + duration);
                self.apply_mode(now);
                // Ask for a fresh fix right away so the viewer is not
                // stuck watching the last stale point.
                self.request_fix();
            }
            AgentCommand::UploadResult(outcome) => {
                self.on_upload_result(outcome, now);
            }
            AgentCommand::SettingsChanged(config) => {
                tracing::info!(
                    update_interval_secs = config.update_interval.as_secs(),
                    idle_heartbeat_secs = config.idle_heartbeat.as_secs(),
                    "Config snapshot swapped"
                );
                self.config = config;
                self.apply_mode(now);
                self.rearm_sample_clock(now);
            }
            AgentCommand::PermissionRevoked => {
                tracing::warn!("Location permission revoked, sampling suspended");
                self.permission_granted = false;
                self.controller.clear_live();
                self.apply_mode(now);
                self.next_sample = None;
            }
            AgentCommand::Stop => {
                tracing::info!("Tracking stopped by user");
                return false;
            }
        }
        true
    }

    async fn on_fix(&mut self, fix: LocationFix, now: Instant) {
        if !self.permission_granted {
            return;
        }

        // The clock counts from the last processed fix.
        self.rearm_sample_clock(now);

        let moving = self.classifier.classify(Position {
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed_ms: fix.speed_ms,
        });
        if moving {
            self.controller.note_movement(now);
        }
        self.apply_mode(now);

        if self.auth_block.is_active(now) {
            tracing::debug!("Upload suppressed by auth block");
            return;
        }
        if !self.can_attempt(now) {
            tracing::debug!(
                failures = self.backoff.failures(),
                "Upload postponed by backoff"
            );
            return;
        }

        let since_last = self.last_upload.map(|at| now.duration_since(at));
        let Some(reason) = gate::should_upload(self.mode, moving, since_last, &self.config) else {
            return;
        };

        self.transmit(fix, moving, reason, now);
    }

    fn transmit(&mut self, fix: LocationFix, moving: bool, reason: UploadReason, now: Instant) {
        let sample = OutboundSample {
            device_uuid: self.config.device_uuid,
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy_m: fix.accuracy_m,
            speed_kmh: fix.speed_ms.map(|ms| ms * 3.6),
            heading_deg: fix.heading_deg,
            altitude_m: fix.altitude_m,
            is_moving: moving as u8,
            battery_level: fix.battery_level,
            source: reason.as_str(),
        };

        self.last_attempt = Some(now);

        let uploader = self.uploader.clone();
        let result_tx = self.result_tx.clone();
        tokio::spawn(async move {
            let outcome = uploader.upload(sample).await;
            let _ = result_tx.send(AgentCommand::UploadResult(outcome)).await;
        });
    }

    fn on_upload_result(&mut self, outcome: UploadOutcome, now: Instant) {
        match outcome {
            UploadOutcome::Accepted { rate_limited } => {
                self.backoff.reset();
                self.last_upload = Some(now);
                if rate_limited {
                    tracing::debug!("Server deduplicated the sample");
                }
            }
            UploadOutcome::AuthRejected | UploadOutcome::SubscriptionLocked => {
                let alert = self.auth_block.engage(now, self.config.auth_block);
                if alert {
                    tracing::warn!(
                        window_secs = self.config.auth_block.as_secs(),
                        "Uploads blocked after auth/billing rejection"
                    );
                }
            }
            UploadOutcome::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Sample rejected by server, dropped");
            }
            UploadOutcome::Transient(reason) => {
                self.backoff.record_failure();
                tracing::debug!(
                    reason = %reason,
                    failures = self.backoff.failures(),
                    "Transient upload failure"
                );
                if self.mode == TrackingMode::Live
                    && self.backoff.failures() >= self.config.live_failure_limit
                {
                    tracing::info!("Leaving LIVE after repeated upload failures");
                    self.controller.clear_live();
                    // The downgrade lands in MOVING, not IDLE.
                    self.controller.note_movement(now);
                    self.apply_mode(now);
                }
            }
        }
    }

    fn can_attempt(&self, now: Instant) -> bool {
        match (self.backoff.delay(), self.last_attempt) {
            (Some(delay), Some(at)) => now.duration_since(at) >= delay,
            _ => true,
        }
    }

    /// Re-resolve the mode and run entry/exit side effects.
    fn apply_mode(&mut self, now: Instant) {
        let next = self.controller.resolve(now, &self.config);
        if next == self.mode {
            return;
        }

        tracing::info!(from = self.mode.as_str(), to = next.as_str(), "Mode change");

        if next == TrackingMode::Live {
            self.wake.acquire(self.config.wake_cap);
            self.next_renewal = Some(now + self.config.wake_renewal);
        } else if self.mode == TrackingMode::Live {
            self.wake.release();
            self.next_renewal = None;
        }

        self.mode = next;
        let _ = self.mode_tx.send(next);
        if self.permission_granted {
            self.rearm_sample_clock(now);
        }
    }

    /// The sample clock fired: ask the platform for a fix. In IDLE this
    /// is the heartbeat that keeps presence alive without movement.
    fn sample_tick(&mut self) {
        let now = Instant::now();
        // The live window or movement recency can lapse with no fix or
        // command arriving; the clock is what notices.
        let before = self.mode;
        self.apply_mode(now);
        if self.mode != before {
            // apply_mode rearmed the clock; this tick was the old mode's.
            return;
        }
        self.rearm_sample_clock(now);
        if !self.permission_granted {
            return;
        }
        tracing::debug!(mode = self.mode.as_str(), "Sample clock tick");
        self.request_fix();
    }

    fn rearm_sample_clock(&mut self, now: Instant) {
        let profile = ModeController::profile(self.mode, &self.config);
        self.next_sample = Some(now + profile.interval);
    }

    fn renew_wake_lock(&mut self) {
        let now = Instant::now();
        // Re-resolve first: a lapsed live window must end the renewal
        // cycle, never extend it.
        self.apply_mode(now);
        if self.mode == TrackingMode::Live {
            self.wake.acquire(self.config.wake_cap);
            self.next_renewal = Some(now + self.config.wake_renewal);
        } else {
            self.next_renewal = None;
        }
    }

    fn request_fix(&self) {
        let request = FixRequest {
            high_accuracy: self.mode == TrackingMode::Live || self.config.high_accuracy,
        };
        // A lagging platform glue gets its requests coalesced; dropping
        // here keeps the worker from ever blocking on its own output.
        if self.fix_tx.try_send(request).is_err() {
            tracing::debug!("Fix request dropped, platform glue is behind");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wake::CountingWakeLock;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedUploader {
        outcomes: Mutex<Vec<UploadOutcome>>,
        uploads: Mutex<Vec<OutboundSample>>,
    }

    impl ScriptedUploader {
        fn accepting() -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(vec![]),
                uploads: Mutex::new(vec![]),
            })
        }

        /// Outcomes are popped front to back; empty script means accept.
        fn scripted(outcomes: Vec<UploadOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                uploads: Mutex::new(vec![]),
            })
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }

        fn sources(&self) -> Vec<&'static str> {
            self.uploads.lock().unwrap().iter().map(|s| s.source).collect()
        }
    }

    #[async_trait::async_trait]
    impl Uploader for ScriptedUploader {
        async fn upload(&self, sample: OutboundSample) -> UploadOutcome {
            self.uploads.lock().unwrap().push(sample);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                UploadOutcome::Accepted {
                    rate_limited: false,
                }
            } else {
                outcomes.remove(0)
            }
        }
    }

    fn config() -> Arc<TrackingConfig> {
        Arc::new(TrackingConfig::new(
            "http://localhost".into(),
            Uuid::new_v4(),
            "token".into(),
        ))
    }

    fn fix(latitude: f64, longitude: f64) -> LocationFix {
        LocationFix {
            latitude,
            longitude,
            accuracy_m: Some(10.0),
            speed_ms: None,
            heading_deg: None,
            altitude_m: None,
            battery_level: Some(80),
        }
    }

    async fn settle() {
        // Lets the worker drain its mailbox and spawned uploads finish.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_heartbeat_forces_upload_without_movement() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, mut fix_rx, _join) =
            spawn_agent(config(), uploader.clone(), wake);

        // Eleven minutes of stillness; the 10-minute heartbeat fires.
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;
        let request = fix_rx.try_recv().expect("heartbeat should request a fix");
        assert!(!request.high_accuracy);

        handle.submit_fix(fix(48.1486, 17.1077)).await;
        settle().await;

        assert_eq!(uploader.upload_count(), 1);
        assert_eq!(uploader.sources(), vec!["heartbeat"]);
        assert_eq!(handle.mode(), TrackingMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_movement_promotes_to_moving_and_uploads() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, _fix_rx, _join) = spawn_agent(config(), uploader.clone(), wake);

        handle.submit_fix(fix(48.1486, 17.1077)).await;
        settle().await;

        // ~111 m displacement.
        handle.submit_fix(fix(48.1496, 17.1077)).await;
        settle().await;

        assert_eq!(handle.mode(), TrackingMode::Moving);
        assert!(uploader.sources().contains(&"gps"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_view_acquires_and_renews_wake_lock() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, mut fix_rx, _join) =
            spawn_agent(config(), uploader, wake.clone());

        handle.live_view(Duration::from_secs(600)).await;
        settle().await;

        assert_eq!(handle.mode(), TrackingMode::Live);
        assert!(wake.is_held());
        assert_eq!(wake.acquisitions(), 1);
        // Entering LIVE immediately asks for a high-accuracy fix.
        assert!(fix_rx.try_recv().expect("live view requests a fix").high_accuracy);

        // Renewal reacquires every 90 s while LIVE persists.
        tokio::time::sleep(Duration::from_secs(91)).await;
        assert_eq!(wake.acquisitions(), 2);
        tokio::time::sleep(Duration::from_secs(91)).await;
        assert_eq!(wake.acquisitions(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_wake_lock() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, _fix_rx, join) = spawn_agent(config(), uploader, wake.clone());

        handle.live_view(Duration::from_secs(600)).await;
        settle().await;
        assert!(wake.is_held());

        handle.stop().await;
        let _ = join.await;
        assert!(!wake.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_transient_failures_in_live_downgrade_to_moving() {
        let uploader = ScriptedUploader::scripted(vec![
            UploadOutcome::Transient("500".into()),
            UploadOutcome::Transient("500".into()),
            UploadOutcome::Transient("500".into()),
        ]);
        let wake = CountingWakeLock::new();
        let (handle, _fix_rx, _join) =
            spawn_agent(config(), uploader.clone(), wake.clone());

        handle.live_view(Duration::from_secs(3600)).await;
        settle().await;
        assert_eq!(handle.mode(), TrackingMode::Live);

        // Each attempt waits out the backoff ladder (10 s, 30 s).
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;

        assert_eq!(uploader.upload_count(), 3);
        assert_eq!(handle.mode(), TrackingMode::Moving);
        // Leaving LIVE released the lock.
        assert!(!wake.is_held());

        // A later success resets the failure counter; the next fix
        // uploads without waiting out a backoff window.
        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.submit_fix(fix(48.01, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 4);
        handle.submit_fix(fix(48.02, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_rejection_blocks_uploads_for_window() {
        let uploader = ScriptedUploader::scripted(vec![UploadOutcome::AuthRejected]);
        let wake = CountingWakeLock::new();
        let (handle, _fix_rx, _join) = spawn_agent(config(), uploader.clone(), wake);

        handle.live_view(Duration::from_secs(7200)).await;
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 1);

        // Inside the 30-minute block nothing is transmitted.
        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.submit_fix(fix(48.1, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 1);

        // The block lifts itself after the window.
        tokio::time::sleep(Duration::from_secs(1800)).await;
        handle.submit_fix(fix(48.2, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lapsed_live_window_releases_wake_lock_without_fixes() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, _fix_rx, _join) = spawn_agent(config(), uploader, wake.clone());

        handle.live_view(Duration::from_secs(30)).await;
        settle().await;
        assert!(wake.is_held());
        assert_eq!(wake.acquisitions(), 1);

        // GPS goes silent: no fix and no command for ten minutes. The
        // sample clock alone must notice the lapsed window, leave LIVE,
        // and stop the renewal cycle.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(handle.mode(), TrackingMode::Idle);
        assert!(!wake.is_held());
        assert_eq!(wake.acquisitions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_heartbeat_still_owed_on_next_sample() {
        let uploader =
            ScriptedUploader::scripted(vec![UploadOutcome::Transient("timeout".into())]);
        let wake = CountingWakeLock::new();
        let (handle, mut fix_rx, _join) = spawn_agent(config(), uploader.clone(), wake);

        // First heartbeat attempt fails in transit.
        tokio::time::sleep(Duration::from_secs(601)).await;
        let _ = fix_rx.try_recv();
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 1);

        // Once the 10 s backoff lapses, the next stationary sample is
        // still a heartbeat; the failed attempt did not satisfy it.
        tokio::time::sleep(Duration::from_secs(20)).await;
        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 2);
        assert_eq!(uploader.sources(), vec!["heartbeat", "heartbeat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_revoked_suspends_sampling() {
        let uploader = ScriptedUploader::accepting();
        let wake = CountingWakeLock::new();
        let (handle, mut fix_rx, _join) = spawn_agent(config(), uploader.clone(), wake);

        handle.send(AgentCommand::PermissionRevoked).await;
        settle().await;

        handle.submit_fix(fix(48.0, 17.0)).await;
        settle().await;
        assert_eq!(uploader.upload_count(), 0);

        // Heartbeats stop requesting fixes too.
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;
        assert!(fix_rx.try_recv().is_err());
    }
}
