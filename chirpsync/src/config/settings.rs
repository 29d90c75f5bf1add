//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. These
//! are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::settings::{RetryDrainPolicy, SyncSettings};

/// Complete host configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// Account identity.
    pub account: AccountSection,
    /// Periodic sync behavior.
    pub sync: SyncSection,
    /// Log output.
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// The engine-level sync settings this configuration seeds.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            interval_secs: self.sync.interval_secs,
            enabled: self.sync.enabled,
            retry_drain: self.sync.retry_drain,
        }
    }
}

/// `[account]`: who the engine syncs for.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSection {
    /// Remote user id of the current account.
    pub user_id: u64,
    /// Screen name, for logs.
    pub screen_name: String,
}

/// `[sync]`: periodic sync behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSection {
    /// Interval between automatic updates, in seconds.
    pub interval_secs: u64,
    /// Whether automatic updates run at all.
    pub enabled: bool,
    /// When retried work folds back into the main queue.
    pub retry_drain: RetryDrainPolicy,
}

/// `[logging]`: log file placement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSection {
    /// Directory for log files.
    pub directory: PathBuf,
    /// Log file name.
    pub file: String,
}
