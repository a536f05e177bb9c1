//! Wake-lock seam.
//!
//! The platform lock is always acquired with a hard timeout so a
//! crashed or wedged agent can never pin the device awake. LIVE mode
//! keeps the lock alive by renewing before the cap runs out.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Platform wake-lock handle. Acquire is idempotent while held; the
/// cap bounds every acquisition including renewals.
pub trait WakeLock: Send + Sync {
    fn acquire(&self, cap: Duration);
    fn release(&self);
    fn is_held(&self) -> bool;
}

/// No-op lock for platforms without one (and for the server-side
/// simulator).
#[derive(Debug, Default)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&self, _cap: Duration) {}
    fn release(&self) {}
    fn is_held(&self) -> bool {
        false
    }
}

/// Test lock that counts acquisitions and tracks held state.
#[derive(Debug, Default)]
pub struct CountingWakeLock {
    acquisitions: AtomicU32,
    held: AtomicU32,
}

impl CountingWakeLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn acquisitions(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

impl WakeLock for CountingWakeLock {
    fn acquire(&self, _cap: Duration) {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.held.store(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.store(0, Ordering::SeqCst);
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_lock_tracks_state() {
        let lock = CountingWakeLock::new();
        assert!(!lock.is_held());

        lock.acquire(Duration::from_secs(120));
        assert!(lock.is_held());
        assert_eq!(lock.acquisitions(), 1);

        lock.acquire(Duration::from_secs(120));
        assert_eq!(lock.acquisitions(), 2);

        lock.release();
        assert!(!lock.is_held());
    }
}
