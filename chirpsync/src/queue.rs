//! Bounded FIFO command queues with identity deduplication.
//!
//! Two instances exist in a running engine: the main queue (fresh work)
//! and the retry queue (failed work still holding budget). Both are
//! internally synchronized; insert/remove/iterate are short critical
//! sections safe to call from the dispatcher and the worker concurrently.
//!
//! Rejections (duplicate identity, capacity) are not errors: they log and
//! return `false`, and the caller carries on.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::command::{Command, IdentityKey};

/// Fixed per-queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

struct Inner {
    items: VecDeque<Command>,
    // Mirror of the identity keys currently queued, for O(1) dedup.
    keys: HashSet<IdentityKey>,
}

/// A bounded, ordered, internally synchronized collection of commands.
///
/// Strict FIFO, no priorities. Capacity is fixed at construction;
/// insertion beyond it fails loudly (logged) rather than blocking.
pub struct CommandQueue {
    name: &'static str,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl CommandQueue {
    /// Creates a queue with the default capacity.
    pub fn new(name: &'static str) -> Self {
        Self::with_capacity(name, DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a queue with an explicit capacity.
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                keys: HashSet::with_capacity(capacity),
            }),
        }
    }

    /// The queue's display name (for logs).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Attempts to append a command.
    ///
    /// Returns `false` when an equal identity key is already queued or the
    /// queue is full. Both outcomes are logged and swallowed; callers have
    /// no error to handle.
    pub fn try_enqueue(&self, command: Command) -> bool {
        let key = command.identity_key();
        let mut inner = self.inner.lock().unwrap();

        if inner.keys.contains(&key) {
            debug!(
                queue = self.name,
                command = %command,
                identity = %key,
                "Duplicate command dropped"
            );
            return false;
        }
        if inner.items.len() >= self.capacity {
            warn!(
                queue = self.name,
                command = %command,
                capacity = self.capacity,
                "Queue full, command dropped"
            );
            return false;
        }

        inner.keys.insert(key);
        inner.items.push_back(command);
        true
    }

    /// Removes and returns the oldest command, if any. Non-blocking.
    pub fn try_dequeue(&self) -> Option<Command> {
        let mut inner = self.inner.lock().unwrap();
        let command = inner.items.pop_front()?;
        inner.keys.remove(&command.identity_key());
        Some(command)
    }

    /// Removes and returns every queued command in order.
    pub fn drain(&self) -> Vec<Command> {
        let mut inner = self.inner.lock().unwrap();
        inner.keys.clear();
        inner.items.drain(..).collect()
    }

    /// Returns an ordered copy of the queue contents without removing
    /// them. Used by the persistence adapter at shutdown.
    pub fn snapshot(&self) -> Vec<Command> {
        let inner = self.inner.lock().unwrap();
        inner.items.iter().cloned().collect()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }
}
