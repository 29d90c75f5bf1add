//! Preference storage collaborator.
//!
//! Preference UI and persistence are the host's concern; the engine only
//! needs scoped string get/set plus a typed read of the sync settings it
//! re-checks at the dispatch boundary.

use dashmap::DashMap;

use crate::settings::{RetryDrainPolicy, SyncSettings, DEFAULT_SYNC_INTERVAL_SECS};

/// Preference key: periodic sync interval in seconds.
pub const PREF_SYNC_INTERVAL: &str = "sync.interval_secs";
/// Preference key: whether periodic sync is enabled.
pub const PREF_SYNC_ENABLED: &str = "sync.enabled";
/// Preference key: retry drain policy ("when-idle" or "eager").
pub const PREF_RETRY_DRAIN: &str = "sync.retry_drain";

/// Scope of a preference write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrefScope {
    /// Per-account preference.
    #[default]
    User,
    /// Device-wide preference.
    Global,
}

impl PrefScope {
    /// Parses a wire scope string; anything unrecognized is `User`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "global" => PrefScope::Global,
            _ => PrefScope::User,
        }
    }

    /// The wire code for this scope.
    pub fn code(self) -> &'static str {
        match self {
            PrefScope::User => "user",
            PrefScope::Global => "global",
        }
    }
}

/// Scoped key-value preference storage.
pub trait Preferences: Send + Sync + 'static {
    /// Reads a preference, if set.
    fn get(&self, scope: PrefScope, key: &str) -> Option<String>;

    /// Writes a preference.
    fn set(&self, scope: PrefScope, key: &str, value: &str);
}

/// Reads the engine's sync settings out of preference storage, falling
/// back to defaults for anything unset or unparseable.
pub fn read_sync_settings(prefs: &dyn Preferences) -> SyncSettings {
    let interval_secs = prefs
        .get(PrefScope::User, PREF_SYNC_INTERVAL)
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
    let enabled = prefs
        .get(PrefScope::User, PREF_SYNC_ENABLED)
        .and_then(|v| v.parse().ok())
        .unwrap_or(true);
    let retry_drain = prefs
        .get(PrefScope::User, PREF_RETRY_DRAIN)
        .map(|v| RetryDrainPolicy::from_code(&v))
        .unwrap_or_default();

    SyncSettings {
        interval_secs,
        enabled,
        retry_drain,
    }
}

/// In-memory preference storage for tests and the CLI host.
#[derive(Default)]
pub struct MemoryPreferences {
    values: DashMap<(PrefScope, String), String>,
}

impl MemoryPreferences {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, scope: PrefScope, key: &str) -> Option<String> {
        self.values
            .get(&(scope, key.to_string()))
            .map(|v| v.value().clone())
    }

    fn set(&self, scope: PrefScope, key: &str, value: &str) {
        self.values
            .insert((scope, key.to_string()), value.to_string());
    }
}
