//! The fixed set of command kinds and their scheduling classification.
//!
//! `CommandKind` is pure data: wire codes and persisted field names live in
//! [`super::codec`], keeping the type free of serialization concerns.

use std::fmt;

/// Every operation the engine can be asked to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Download the home timeline since the newest locally-known status.
    FetchTimeline,
    /// Download direct messages since the newest locally-known message.
    FetchMessages,
    /// Post a new status (optionally in reply to another).
    UpdateStatus,
    /// Delete a status owned by the current user.
    DestroyStatus,
    /// Mark a status as a favorite.
    CreateFavorite,
    /// Remove a favorite mark.
    DestroyFavorite,
    /// Query the service's remaining API quota.
    RateLimitStatus,
    /// Start the periodic background sync trigger.
    StartSync,
    /// Stop the periodic background sync trigger.
    StopSync,
    /// Restart the periodic trigger, picking up a new interval.
    RestartSync,
    /// Write a single preference value.
    ApplyPreference,
    /// Post a host notification describing pending queue work.
    NotifyQueue,
    /// Clear previously posted host notifications.
    ClearNotifications,
    /// Preferences were changed externally; sync settings need a re-read.
    PreferencesChanged,
    /// Decoded from an unknown or missing kind; always dropped.
    NoOp,
}

impl CommandKind {
    /// Whether a failed attempt of this kind may consume retry budget and
    /// be re-queued. Only kinds that talk to the remote service retry;
    /// everything else is discarded on failure.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            CommandKind::FetchTimeline
                | CommandKind::FetchMessages
                | CommandKind::UpdateStatus
                | CommandKind::DestroyStatus
                | CommandKind::CreateFavorite
                | CommandKind::DestroyFavorite
                | CommandKind::RateLimitStatus
        )
    }

    /// Whether this kind executes synchronously at the dispatch boundary
    /// and never enters a queue.
    pub fn is_immediate(self) -> bool {
        matches!(
            self,
            CommandKind::StartSync
                | CommandKind::StopSync
                | CommandKind::RestartSync
                | CommandKind::ApplyPreference
                | CommandKind::PreferencesChanged
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", super::codec::kind_code(*self))
    }
}
