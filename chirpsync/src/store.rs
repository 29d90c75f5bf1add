//! Local cache collaborator: the data store interface.
//!
//! The engine treats the relational store as an opaque collaborator with
//! idempotent upsert-by-remote-id semantics; query and merge logic for
//! screens lives on the host side. [`MemoryDataStore`] is a complete
//! in-memory implementation used by tests and the CLI simulator.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::api::{DirectMessage, Status};

/// Failures raised by the local store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A uniqueness or referential constraint was violated. Retrying the
    /// same write would repeat the same conflict.
    #[error("store constraint violation: {0}")]
    Constraint(String),

    /// Underlying storage I/O failed.
    #[error("store I/O failure: {0}")]
    Io(String),
}

/// Outcome of a status upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// How many statuses were new to the store.
    pub inserted: usize,
    /// How many of the new statuses reply to the current user.
    pub replies: usize,
}

/// The local cache surface the executor drives.
///
/// All writes are idempotent per remote id: upserting an already-known
/// object updates it in place and does not count as new.
pub trait DataStore: Send + Sync + 'static {
    /// Upserts a batch of statuses, counting which were new and which of
    /// the new ones address `current_user_id`.
    fn upsert_statuses(
        &self,
        statuses: &[Status],
        current_user_id: u64,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Upserts a batch of direct messages, returning how many were new.
    fn upsert_messages(&self, messages: &[DirectMessage]) -> Result<usize, StoreError>;

    /// Deletes a status by remote id. Deleting an unknown id is not an
    /// error.
    fn delete_status(&self, id: u64) -> Result<(), StoreError>;

    /// Sets the favorite flag on a locally-known status.
    fn set_favorite(&self, id: u64, favorited: bool) -> Result<(), StoreError>;

    /// Newest locally-known status id, for since-id fetches.
    fn latest_status_id(&self) -> Result<Option<u64>, StoreError>;

    /// Newest locally-known message id, for since-id fetches.
    fn latest_message_id(&self) -> Result<Option<u64>, StoreError>;

    /// Drops all but the newest `keep` statuses, returning how many were
    /// removed.
    fn prune(&self, keep: usize) -> Result<usize, StoreError>;
}

/// In-memory data store keyed by remote id.
#[derive(Default)]
pub struct MemoryDataStore {
    statuses: Mutex<BTreeMap<u64, Status>>,
    messages: Mutex<BTreeMap<u64, DirectMessage>>,
}

impl MemoryDataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored statuses.
    pub fn status_count(&self) -> usize {
        self.statuses.lock().unwrap().len()
    }

    /// Looks up a stored status by remote id.
    pub fn status(&self, id: u64) -> Option<Status> {
        self.statuses.lock().unwrap().get(&id).cloned()
    }

    /// Number of stored messages.
    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl DataStore for MemoryDataStore {
    fn upsert_statuses(
        &self,
        statuses: &[Status],
        current_user_id: u64,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut table = self.statuses.lock().unwrap();
        let mut outcome = UpsertOutcome::default();
        for status in statuses {
            let is_new = !table.contains_key(&status.id);
            table.insert(status.id, status.clone());
            if is_new {
                outcome.inserted += 1;
                if status.in_reply_to_user_id == Some(current_user_id) {
                    outcome.replies += 1;
                }
            }
        }
        Ok(outcome)
    }

    fn upsert_messages(&self, messages: &[DirectMessage]) -> Result<usize, StoreError> {
        let mut table = self.messages.lock().unwrap();
        let mut inserted = 0;
        for message in messages {
            if table.insert(message.id, message.clone()).is_none() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn delete_status(&self, id: u64) -> Result<(), StoreError> {
        self.statuses.lock().unwrap().remove(&id);
        Ok(())
    }

    fn set_favorite(&self, id: u64, favorited: bool) -> Result<(), StoreError> {
        if let Some(status) = self.statuses.lock().unwrap().get_mut(&id) {
            status.favorited = favorited;
        }
        Ok(())
    }

    fn latest_status_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.statuses.lock().unwrap().keys().next_back().copied())
    }

    fn latest_message_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.messages.lock().unwrap().keys().next_back().copied())
    }

    fn prune(&self, keep: usize) -> Result<usize, StoreError> {
        let mut table = self.statuses.lock().unwrap();
        if table.len() <= keep {
            return Ok(0);
        }
        let excess = table.len() - keep;
        let cutoff: Vec<u64> = table.keys().take(excess).copied().collect();
        for id in &cutoff {
            table.remove(id);
        }
        Ok(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn status(id: u64, reply_to_user: Option<u64>) -> Status {
        Status {
            id,
            author_id: 1,
            author_screen_name: "tester".into(),
            text: format!("status {id}"),
            created_at: Utc::now(),
            in_reply_to_status_id: None,
            in_reply_to_user_id: reply_to_user,
            favorited: false,
        }
    }

    fn message(id: u64) -> DirectMessage {
        DirectMessage {
            id,
            sender_id: 2,
            sender_screen_name: "sender".into(),
            text: format!("message {id}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_counts_new_and_replies() {
        let store = MemoryDataStore::new();
        let batch = [status(1, None), status(2, Some(77)), status(3, Some(88))];

        let outcome = store.upsert_statuses(&batch, 77).unwrap();
        assert_eq!(outcome.inserted, 3);
        assert_eq!(outcome.replies, 1);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = MemoryDataStore::new();
        let batch = [status(1, None)];
        store.upsert_statuses(&batch, 0).unwrap();

        let outcome = store.upsert_statuses(&batch, 0).unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.status_count(), 1);
    }

    #[test]
    fn test_latest_ids() {
        let store = MemoryDataStore::new();
        assert_eq!(store.latest_status_id().unwrap(), None);

        store
            .upsert_statuses(&[status(5, None), status(9, None), status(2, None)], 0)
            .unwrap();
        assert_eq!(store.latest_status_id().unwrap(), Some(9));

        store.upsert_messages(&[message(4), message(11)]).unwrap();
        assert_eq!(store.latest_message_id().unwrap(), Some(11));
    }

    #[test]
    fn test_delete_and_favorite() {
        let store = MemoryDataStore::new();
        store.upsert_statuses(&[status(1, None)], 0).unwrap();

        store.set_favorite(1, true).unwrap();
        store.delete_status(1).unwrap();
        assert_eq!(store.status_count(), 0);

        // Unknown ids are tolerated.
        store.delete_status(999).unwrap();
        store.set_favorite(999, true).unwrap();
    }

    #[test]
    fn test_prune_keeps_newest() {
        let store = MemoryDataStore::new();
        let batch: Vec<Status> = (1..=10).map(|id| status(id, None)).collect();
        store.upsert_statuses(&batch, 0).unwrap();

        let removed = store.prune(3).unwrap();
        assert_eq!(removed, 7);
        assert_eq!(store.status_count(), 3);
        assert_eq!(store.latest_status_id().unwrap(), Some(10));
    }
}
