//! Engine-level sync settings.
//!
//! Pure data; the values come from preference storage (see
//! [`crate::prefs::read_sync_settings`]) or from the host's config file.

/// Default periodic sync interval in seconds.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// When the retry queue is folded back into the main queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetryDrainPolicy {
    /// Drain only when the main queue is empty at dispatch time. This is
    /// the inherited behavior: retried work can be starved indefinitely
    /// while new work keeps arriving. Kept as the default pending product
    /// confirmation (see DESIGN.md).
    #[default]
    WhenIdle,
    /// Drain on every dispatch, appending retried work behind whatever is
    /// already queued.
    Eager,
}

impl RetryDrainPolicy {
    /// Parses a policy code; anything unrecognized is `WhenIdle`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "eager" => RetryDrainPolicy::Eager,
            _ => RetryDrainPolicy::WhenIdle,
        }
    }

    /// The config/preference code for this policy.
    pub fn code(self) -> &'static str {
        match self {
            RetryDrainPolicy::WhenIdle => "when-idle",
            RetryDrainPolicy::Eager => "eager",
        }
    }
}

/// Settings the dispatcher re-reads when preferences change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    /// Periodic sync interval in seconds.
    pub interval_secs: u64,
    /// Whether periodic sync runs at all.
    pub enabled: bool,
    /// Retry drain policy.
    pub retry_drain: RetryDrainPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            enabled: true,
            retry_drain: RetryDrainPolicy::default(),
        }
    }
}
