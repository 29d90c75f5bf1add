//! Observer registry: fan-out of sync events to attached UI components.
//!
//! UI components come and go; the registry supports dynamic register /
//! unregister and tolerates misbehaving observers. Fan-out is synchronous
//! but per-observer isolated: a panicking observer is logged, removed,
//! and the broadcast continues. Observers that need to do real work
//! should forward events into their own channel and return immediately.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::command::CommandKind;

/// Classification of a terminal sync failure surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// Credentials rejected; user action required.
    Authentication,
    /// Local store refused the write.
    Store,
    /// The service answered with a payload the client cannot read.
    MalformedPayload,
}

/// A terminal failure event delivered to observers.
#[derive(Clone, Debug)]
pub struct SyncErrorEvent {
    /// What went wrong.
    pub kind: SyncErrorKind,
    /// The command kind that failed.
    pub command: CommandKind,
    /// Human-readable detail.
    pub message: String,
}

/// A registered UI-side listener for completion/progress events.
///
/// All methods default to no-ops so observers implement only what they
/// present. Callbacks run on the executor's task; keep them fast.
pub trait SyncObserver: Send + Sync + 'static {
    /// New timeline items landed in the local store.
    fn on_items_changed(&self, _count: usize) {}

    /// New replies to the current user landed in the local store.
    fn on_replies_changed(&self, _count: usize) {}

    /// New direct messages landed in the local store.
    fn on_messages_changed(&self, _count: usize) {}

    /// The executor started or finished a pass.
    fn on_loading_state_changed(&self, _loading: bool) {}

    /// Fresh rate-limit figures from the service.
    fn on_rate_limit_status(&self, _remaining: u32, _limit: u32) {}

    /// A command failed terminally; the UI may want a dialog.
    fn on_sync_error(&self, _event: &SyncErrorEvent) {}
}

/// Handle identifying a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Thread-safe set of registered observers.
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: DashMap<u64, Arc<dyn SyncObserver>>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: DashMap::new(),
        }
    }

    /// Registers an observer, returning the id used to disconnect it.
    pub fn register(&self, observer: Arc<dyn SyncObserver>) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.insert(id, observer);
        debug!(observer_id = id, total = self.observers.len(), "Observer registered");
        ObserverId(id)
    }

    /// Unregisters an observer. Returns false when the id was already
    /// gone (e.g. removed after a panic).
    pub fn unregister(&self, id: ObserverId) -> bool {
        let removed = self.observers.remove(&id.0).is_some();
        debug!(observer_id = id.0, removed, "Observer unregistered");
        removed
    }

    /// Number of attached observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True when no UI is attached.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Fans an event out to every observer, isolating failures.
    ///
    /// The observer set is snapshotted first so observers may freely
    /// connect or disconnect mid-broadcast; a disconnected observer is
    /// simply skipped when its turn comes.
    fn broadcast(&self, deliver: impl Fn(&dyn SyncObserver)) {
        let snapshot: Vec<(u64, Arc<dyn SyncObserver>)> = self
            .observers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        for (id, observer) in snapshot {
            if !self.observers.contains_key(&id) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| deliver(&*observer)));
            if outcome.is_err() {
                warn!(observer_id = id, "Observer panicked during delivery, removing");
                self.observers.remove(&id);
            }
        }
    }

    /// Broadcasts new-item counts.
    pub fn notify_items(&self, count: usize) {
        self.broadcast(|o| o.on_items_changed(count));
    }

    /// Broadcasts new-reply counts.
    pub fn notify_replies(&self, count: usize) {
        self.broadcast(|o| o.on_replies_changed(count));
    }

    /// Broadcasts new-message counts.
    pub fn notify_messages(&self, count: usize) {
        self.broadcast(|o| o.on_messages_changed(count));
    }

    /// Broadcasts a loading-state change.
    pub fn notify_loading(&self, loading: bool) {
        self.broadcast(|o| o.on_loading_state_changed(loading));
    }

    /// Broadcasts fresh rate-limit figures.
    pub fn notify_rate_limit(&self, remaining: u32, limit: u32) {
        self.broadcast(|o| o.on_rate_limit_status(remaining, limit));
    }

    /// Broadcasts a terminal failure.
    pub fn notify_error(&self, event: &SyncErrorEvent) {
        self.broadcast(|o| o.on_sync_error(event));
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_items_changed(&self, count: usize) {
        debug!(count, "Timeline items changed");
    }

    fn on_replies_changed(&self, count: usize) {
        debug!(count, "Replies changed");
    }

    fn on_messages_changed(&self, count: usize) {
        debug!(count, "Messages changed");
    }

    fn on_loading_state_changed(&self, loading: bool) {
        debug!(loading, "Loading state changed");
    }

    fn on_rate_limit_status(&self, remaining: u32, limit: u32) {
        debug!(remaining, limit, "Rate limit status");
    }

    fn on_sync_error(&self, event: &SyncErrorEvent) {
        warn!(kind = ?event.kind, command = %event.command, message = %event.message, "Sync error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingObserver {
        items: AtomicUsize,
        loading: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SyncObserver for CountingObserver {
        fn on_items_changed(&self, count: usize) {
            self.items.fetch_add(count, Ordering::SeqCst);
        }

        fn on_loading_state_changed(&self, _loading: bool) {
            self.loading.fetch_add(1, Ordering::SeqCst);
        }

        fn on_sync_error(&self, _event: &SyncErrorEvent) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingObserver;

    impl SyncObserver for PanickingObserver {
        fn on_items_changed(&self, _count: usize) {
            panic!("observer went away");
        }
    }

    #[test]
    fn test_register_notify_unregister() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(CountingObserver::default());
        let id = registry.register(Arc::clone(&observer) as Arc<dyn SyncObserver>);

        registry.notify_items(5);
        registry.notify_loading(true);
        assert_eq!(observer.items.load(Ordering::SeqCst), 5);
        assert_eq!(observer.loading.load(Ordering::SeqCst), 1);

        assert!(registry.unregister(id));
        registry.notify_items(3);
        assert_eq!(observer.items.load(Ordering::SeqCst), 5);
        assert!(!registry.unregister(id));
    }

    #[test]
    fn test_panicking_observer_removed_broadcast_continues() {
        let registry = ObserverRegistry::new();
        let healthy = Arc::new(CountingObserver::default());
        registry.register(Arc::new(PanickingObserver));
        registry.register(Arc::clone(&healthy) as Arc<dyn SyncObserver>);
        assert_eq!(registry.len(), 2);

        registry.notify_items(1);
        assert_eq!(healthy.items.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);

        // The panicking observer is gone; subsequent broadcasts are clean.
        registry.notify_items(1);
        assert_eq!(healthy.items.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_event_delivery() {
        let registry = ObserverRegistry::new();
        let observer = Arc::new(CountingObserver::default());
        registry.register(Arc::clone(&observer) as Arc<dyn SyncObserver>);

        registry.notify_error(&SyncErrorEvent {
            kind: SyncErrorKind::Authentication,
            command: CommandKind::FetchTimeline,
            message: "credentials rejected".into(),
        });
        assert_eq!(observer.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_registry_broadcast_is_noop() {
        let registry = ObserverRegistry::new();
        assert!(registry.is_empty());
        registry.notify_items(10);
        registry.notify_loading(false);
    }
}
