//! Default values for every configuration section.

use std::path::PathBuf;

use super::settings::{AccountSection, LoggingSection, SyncSection};
use crate::settings::{RetryDrainPolicy, DEFAULT_SYNC_INTERVAL_SECS};

/// Default log directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";
/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "chirpsync.log";

impl Default for AccountSection {
    fn default() -> Self {
        Self {
            user_id: 0,
            screen_name: String::new(),
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            enabled: true,
            retry_drain: RetryDrainPolicy::WhenIdle,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
