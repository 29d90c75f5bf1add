//! Command value objects: one unit of requested work.
//!
//! A [`Command`] is created at the dispatch boundary (from a UI action, a
//! periodic wake-up, or a restored persisted entry), enters a queue, and is
//! dequeued exactly once per attempt by the executor. Identity is an
//! explicit pure function ([`Command::identity_key`]) and retry bookkeeping
//! is a separate pair of counters, so the two concerns are independently
//! testable.

pub mod codec;
mod kind;
mod params;

pub use kind::CommandKind;
pub use params::{ParamMap, ParamValue};

use std::fmt;

/// Sentinel for a command that has never been assigned a retry budget.
pub const UNBUDGETED: i32 = -1;

/// Derived identity used to detect duplicate commands.
///
/// Two commands with equal identity keys describe the same semantic action
/// and must not coexist in a queue. The key never includes retry
/// bookkeeping, so a retried command still collides with a fresh copy of
/// the same request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Returns the canonical string form of this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of requested work.
///
/// Immutable after construction apart from the retry counters, which the
/// executor adjusts through crate-private methods as attempts happen.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    kind: CommandKind,
    target_id: u64,
    params: ParamMap,
    retries_left: i32,
    attempt: u32,
}

impl Command {
    /// Creates a fresh, unbudgeted command.
    pub fn new(kind: CommandKind, target_id: u64, params: ParamMap) -> Self {
        Self {
            kind,
            target_id,
            params,
            retries_left: UNBUDGETED,
            attempt: 0,
        }
    }

    /// Convenience constructor for kinds that carry no target and no params.
    pub fn bare(kind: CommandKind) -> Self {
        Self::new(kind, 0, ParamMap::new())
    }

    /// Reconstructs a command restored from persistence. Restored
    /// commands come back unbudgeted, exactly like fresh ones.
    pub(crate) fn restored(kind: CommandKind, target_id: u64, params: ParamMap) -> Self {
        Self::new(kind, target_id, params)
    }

    /// The command's kind.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The target object id, 0 when not applicable.
    pub fn target_id(&self) -> u64 {
        self.target_id
    }

    /// The command's parameters.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Remaining retry budget. [`UNBUDGETED`] until the first failure
    /// assigns one.
    pub fn retries_left(&self) -> i32 {
        self.retries_left
    }

    /// How many times the executor has attempted this command.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Computes this command's identity key.
    ///
    /// The key covers the kind, the target id, and the subset of params
    /// that make two requests the same semantic action. Retry counters are
    /// deliberately excluded.
    pub fn identity_key(&self) -> IdentityKey {
        let mut canonical = format!("{}|{}", codec::kind_code(self.kind), self.target_id);
        for field in codec::identity_fields(self.kind) {
            if let Some(value) = self.params.get(field) {
                canonical.push('|');
                canonical.push_str(field);
                canonical.push('=');
                canonical.push_str(&value.to_string());
            }
        }
        IdentityKey(canonical)
    }

    /// Records the start of an attempt: consumes one unit of budget
    /// bookkeeping unconditionally, even if the attempt then succeeds.
    pub(crate) fn begin_attempt(&mut self) {
        self.retries_left -= 1;
        self.attempt += 1;
    }

    /// Assigns the default retry budget to a command whose first failure
    /// found it unbudgeted.
    pub(crate) fn assign_budget(&mut self, budget: i32) {
        self.retries_left = budget;
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", codec::kind_code(self.kind), self.target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_status(text: &str, reply: i64) -> Command {
        Command::new(
            CommandKind::UpdateStatus,
            0,
            ParamMap::new()
                .with(codec::FIELD_TEXT, text)
                .with(codec::FIELD_IN_REPLY_TO, reply),
        )
    }

    #[test]
    fn test_new_command_is_unbudgeted() {
        let cmd = Command::bare(CommandKind::FetchTimeline);
        assert_eq!(cmd.retries_left(), UNBUDGETED);
        assert_eq!(cmd.attempt(), 0);
    }

    #[test]
    fn test_identity_ignores_retry_state() {
        let a = update_status("hello", 42);
        let mut b = update_status("hello", 42);
        b.begin_attempt();
        b.assign_budget(9);

        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_identity_differs_on_text() {
        let a = update_status("hello", 42);
        let b = update_status("goodbye", 42);
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_identity_differs_on_reply_target() {
        let a = update_status("hello", 42);
        let b = update_status("hello", 7);
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_identity_differs_on_target_id() {
        let a = Command::new(CommandKind::CreateFavorite, 5, ParamMap::new());
        let b = Command::new(CommandKind::CreateFavorite, 6, ParamMap::new());
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_identity_ignores_extraneous_params() {
        // Only the declared identity fields participate in the key.
        let a = Command::bare(CommandKind::FetchTimeline);
        let b = Command::new(
            CommandKind::FetchTimeline,
            0,
            ParamMap::new().with("auto", true),
        );
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_begin_attempt_bookkeeping() {
        let mut cmd = Command::bare(CommandKind::FetchTimeline);
        cmd.begin_attempt();
        assert_eq!(cmd.retries_left(), UNBUDGETED - 1);
        assert_eq!(cmd.attempt(), 1);

        cmd.assign_budget(9);
        assert_eq!(cmd.retries_left(), 9);
        cmd.begin_attempt();
        assert_eq!(cmd.retries_left(), 8);
        assert_eq!(cmd.attempt(), 2);
    }
}
