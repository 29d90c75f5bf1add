//! Durable queue persistence across process restarts.
//!
//! At shutdown each queue's contents are written, in order, to a
//! key-value area tagged by a storage key; the next cold start restores
//! them and deletes the persisted copy (restore is one-shot).
//!
//! # Persisted field policy
//!
//! Only the fields needed to reconstruct a runnable command survive:
//! `kind<i>` and `target<i>` for every record, plus `text<i>` and
//! `reply<i>` for `update-status`. This narrowing is deliberate: every
//! other queued kind is fully described by kind + target, and restored
//! commands re-enter unbudgeted exactly like fresh ones. Restoration
//! stops at the first index whose kind decodes to unknown.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use ini::Ini;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::codec::{self, FIELD_IN_REPLY_TO, FIELD_TEXT};
use crate::command::{Command, CommandKind, ParamMap};

/// Storage key for the main queue's persisted copy.
pub const MAIN_QUEUE_STORAGE_KEY: &str = "queue-main";
/// Storage key for the retry queue's persisted copy.
pub const RETRY_QUEUE_STORAGE_KEY: &str = "queue-retry";

const KEY_KIND: &str = "kind";
const KEY_TARGET: &str = "target";
const KEY_TEXT: &str = "text";
const KEY_REPLY: &str = "reply";

/// Failures in the durable key-value area.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the backing storage failed.
    #[error("persistence I/O failure: {0}")]
    Io(String),
}

/// Durable string key-value storage, grouped by storage key.
///
/// Implementations must persist writes before returning so that queue
/// snapshots survive an immediate process kill.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads one value.
    fn get(&self, storage_key: &str, key: &str) -> Option<String>;

    /// Writes one value.
    fn put(&self, storage_key: &str, key: &str, value: &str) -> Result<(), PersistError>;

    /// Removes one value. Removing an absent key is not an error.
    fn remove(&self, storage_key: &str, key: &str) -> Result<(), PersistError>;
}

/// Saves an ordered queue snapshot under `storage_key`.
///
/// Any previously persisted records under the same key are purged first
/// so stale tails cannot leak into the next restore.
pub fn save_queue(
    store: &dyn KeyValueStore,
    storage_key: &str,
    commands: &[Command],
) -> Result<usize, PersistError> {
    purge(store, storage_key)?;

    for (index, command) in commands.iter().enumerate() {
        store.put(
            storage_key,
            &format!("{KEY_KIND}{index}"),
            codec::kind_code(command.kind()),
        )?;
        store.put(
            storage_key,
            &format!("{KEY_TARGET}{index}"),
            &command.target_id().to_string(),
        )?;
        if command.kind() == CommandKind::UpdateStatus {
            if let Some(text) = command.params().get_str(FIELD_TEXT) {
                store.put(storage_key, &format!("{KEY_TEXT}{index}"), text)?;
            }
            if let Some(reply) = command.params().get_int(FIELD_IN_REPLY_TO) {
                store.put(storage_key, &format!("{KEY_REPLY}{index}"), &reply.to_string())?;
            }
        }
    }

    if !commands.is_empty() {
        info!(
            storage_key,
            count = commands.len(),
            "Persisted queue snapshot"
        );
    }
    Ok(commands.len())
}

/// Restores and deletes the persisted snapshot under `storage_key`.
///
/// Reads records by increasing index until one is missing or its kind
/// decodes to unknown, then purges the whole area.
pub fn restore_queue(
    store: &dyn KeyValueStore,
    storage_key: &str,
) -> Result<Vec<Command>, PersistError> {
    let mut commands = Vec::new();

    for index in 0.. {
        let Some(code) = store.get(storage_key, &format!("{KEY_KIND}{index}")) else {
            break;
        };
        let kind = codec::kind_from_code(&code);
        if kind == CommandKind::NoOp {
            warn!(storage_key, index, code = %code, "Unreadable persisted record, stopping restore");
            break;
        }

        let target_id = store
            .get(storage_key, &format!("{KEY_TARGET}{index}"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let mut params = ParamMap::new();
        if kind == CommandKind::UpdateStatus {
            if let Some(text) = store.get(storage_key, &format!("{KEY_TEXT}{index}")) {
                params.insert(FIELD_TEXT, text);
            }
            if let Some(reply) = store.get(storage_key, &format!("{KEY_REPLY}{index}")) {
                if let Ok(reply) = reply.parse::<i64>() {
                    params.insert(FIELD_IN_REPLY_TO, reply);
                }
            }
        }

        commands.push(Command::restored(kind, target_id, params));
    }

    purge(store, storage_key)?;
    if !commands.is_empty() {
        info!(storage_key, count = commands.len(), "Restored queue snapshot");
    }
    Ok(commands)
}

/// Removes every record under `storage_key`.
fn purge(store: &dyn KeyValueStore, storage_key: &str) -> Result<(), PersistError> {
    for index in 0.. {
        let key = format!("{KEY_KIND}{index}");
        if store.get(storage_key, &key).is_none() {
            break;
        }
        store.remove(storage_key, &key)?;
        store.remove(storage_key, &format!("{KEY_TARGET}{index}"))?;
        store.remove(storage_key, &format!("{KEY_TEXT}{index}"))?;
        store.remove(storage_key, &format!("{KEY_REPLY}{index}"))?;
    }
    Ok(())
}

/// In-memory key-value storage for tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<(String, String), String>,
}

impl MemoryKeyValueStore {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all storage keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, storage_key: &str, key: &str) -> Option<String> {
        self.values
            .get(&(storage_key.to_string(), key.to_string()))
            .map(|v| v.value().clone())
    }

    fn put(&self, storage_key: &str, key: &str, value: &str) -> Result<(), PersistError> {
        self.values.insert(
            (storage_key.to_string(), key.to_string()),
            value.to_string(),
        );
        Ok(())
    }

    fn remove(&self, storage_key: &str, key: &str) -> Result<(), PersistError> {
        self.values
            .remove(&(storage_key.to_string(), key.to_string()));
        Ok(())
    }
}

/// File-backed key-value storage: one INI file, one section per storage
/// key. Writes go through to disk immediately.
pub struct IniKeyValueStore {
    path: PathBuf,
    document: Mutex<Ini>,
}

impl IniKeyValueStore {
    /// Opens (or creates) the backing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        let document = if path.exists() {
            Ini::load_from_file(&path).map_err(|e| PersistError::Io(e.to_string()))?
        } else {
            Ini::new()
        };
        debug!(path = %path.display(), "Opened queue storage");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    fn flush(&self, document: &Ini) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::Io(e.to_string()))?;
        }
        document
            .write_to_file(&self.path)
            .map_err(|e| PersistError::Io(e.to_string()))
    }
}

impl KeyValueStore for IniKeyValueStore {
    fn get(&self, storage_key: &str, key: &str) -> Option<String> {
        let document = self.document.lock().unwrap();
        document
            .section(Some(storage_key))
            .and_then(|s| s.get(key))
            .map(|v| v.to_string())
    }

    fn put(&self, storage_key: &str, key: &str, value: &str) -> Result<(), PersistError> {
        let mut document = self.document.lock().unwrap();
        document
            .with_section(Some(storage_key))
            .set(key, value);
        self.flush(&document)
    }

    fn remove(&self, storage_key: &str, key: &str) -> Result<(), PersistError> {
        let mut document = self.document.lock().unwrap();
        if let Some(section) = document.section_mut(Some(storage_key)) {
            section.remove(key);
        }
        self.flush(&document)
    }
}
