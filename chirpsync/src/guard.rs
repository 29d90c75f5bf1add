//! Wake-lock and connectivity gate around executor passes.
//!
//! The guard holds a wake-lock-equivalent for the whole pass (not per
//! command) and answers connectivity queries. The underlying lock handle
//! is shared and reference-counted: it is acquired when the first pass
//! starts and released when the last pass ends, never per permit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Host-provided wake-lock-equivalent resource.
///
/// `acquire`/`release` are only called on the 0→1 and 1→0 holder
/// transitions, so implementations need no counting of their own.
pub trait WakeLock: Send + Sync + 'static {
    /// Take the underlying resource.
    fn acquire(&self);

    /// Release the underlying resource.
    fn release(&self);
}

/// Host-provided connectivity probe.
pub trait Connectivity: Send + Sync + 'static {
    /// Whether the device currently has network reachability.
    fn is_online(&self) -> bool;
}

/// Wake lock for hosts without one (servers, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&self) {}

    fn release(&self) {}
}

/// Connectivity probe that always reports online.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Reference-counted wake-lock holder plus connectivity gate.
pub struct ResourceGuard {
    wake_lock: Arc<dyn WakeLock>,
    connectivity: Arc<dyn Connectivity>,
    holders: AtomicUsize,
}

impl ResourceGuard {
    /// Creates a guard over the host's wake lock and connectivity probe.
    pub fn new(wake_lock: Arc<dyn WakeLock>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            wake_lock,
            connectivity,
            holders: AtomicUsize::new(0),
        }
    }

    /// Guard with no-op wake lock and always-online connectivity.
    pub fn unrestricted() -> Self {
        Self::new(Arc::new(NoopWakeLock), Arc::new(AlwaysOnline))
    }

    /// Acquires the guard for one executor pass, returning an RAII permit.
    /// The wake lock is taken only when the holder count goes 0→1.
    pub fn acquire(&self) -> GuardPermit<'_> {
        let previous = self.holders.fetch_add(1, Ordering::AcqRel);
        if previous == 0 {
            self.wake_lock.acquire();
            debug!("Wake lock acquired");
        }
        GuardPermit { guard: self }
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// How many passes currently hold the guard.
    pub fn holder_count(&self) -> usize {
        self.holders.load(Ordering::Acquire)
    }

    fn release(&self) {
        let previous = self.holders.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.wake_lock.release();
            debug!("Wake lock released");
        }
    }
}

/// RAII permit for one executor pass. Dropping it releases the guard; the
/// wake lock itself is released only when the last permit goes away.
pub struct GuardPermit<'a> {
    guard: &'a ResourceGuard,
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    /// Wake lock that counts acquire/release transitions.
    #[derive(Default)]
    struct CountingWakeLock {
        acquires: AtomicUsize,
        releases: AtomicUsize,
    }

    impl WakeLock for CountingWakeLock {
        fn acquire(&self) {
            self.acquires.fetch_add(1, Ordering::SeqCst);
        }

        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Probe whose answer flips via a shared flag.
    struct SwitchedConnectivity(AtomicBool);

    impl Connectivity for SwitchedConnectivity {
        fn is_online(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_wake_lock_taken_once_across_nested_permits() {
        let lock = Arc::new(CountingWakeLock::default());
        let guard = Arc::new(ResourceGuard::new(
            Arc::clone(&lock) as Arc<dyn WakeLock>,
            Arc::new(AlwaysOnline),
        ));

        let first = guard.acquire();
        let second = guard.acquire();
        assert_eq!(lock.acquires.load(Ordering::SeqCst), 1);
        assert_eq!(guard.holder_count(), 2);

        drop(first);
        assert_eq!(lock.releases.load(Ordering::SeqCst), 0);

        drop(second);
        assert_eq!(lock.releases.load(Ordering::SeqCst), 1);
        assert_eq!(guard.holder_count(), 0);
    }

    #[test]
    fn test_reacquire_after_full_release() {
        let lock = Arc::new(CountingWakeLock::default());
        let guard = Arc::new(ResourceGuard::new(
            Arc::clone(&lock) as Arc<dyn WakeLock>,
            Arc::new(AlwaysOnline),
        ));

        drop(guard.acquire());
        drop(guard.acquire());
        assert_eq!(lock.acquires.load(Ordering::SeqCst), 2);
        assert_eq!(lock.releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_connectivity_delegates() {
        let probe = Arc::new(SwitchedConnectivity(AtomicBool::new(true)));
        let guard = Arc::new(ResourceGuard::new(
            Arc::new(NoopWakeLock),
            Arc::clone(&probe) as Arc<dyn Connectivity>,
        ));

        assert!(guard.is_online());
        probe.0.store(false, Ordering::SeqCst);
        assert!(!guard.is_online());
    }
}
