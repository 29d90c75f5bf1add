//! Host notification collaborator.
//!
//! The engine decides *when* the user should be told about pending or
//! completed sync work; how a notification looks (icons, localization,
//! channels) is the host's concern behind this trait.

use tracing::info;

/// Posts user-facing notifications on the engine's behalf.
pub trait Notifier: Send + Sync + 'static {
    /// The device is offline and `pending` commands are waiting.
    fn queue_pending(&self, pending: usize);

    /// A sync pass landed new content.
    fn sync_results(&self, items: usize, replies: usize, messages: usize);

    /// Clear any previously posted sync notifications.
    fn clear(&self);
}

/// Notifier that logs through `tracing` instead of a notification area.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn queue_pending(&self, pending: usize) {
        info!(pending, "Sync pending: device offline");
    }

    fn sync_results(&self, items: usize, replies: usize, messages: usize) {
        info!(items, replies, messages, "Sync results");
    }

    fn clear(&self) {
        info!("Sync notifications cleared");
    }
}

/// No-op notifier for hosts without a notification surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn queue_pending(&self, _pending: usize) {}

    fn sync_results(&self, _items: usize, _replies: usize, _messages: usize) {}

    fn clear(&self) {}
}
