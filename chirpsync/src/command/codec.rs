//! Encode/decode tables for commands.
//!
//! All serialization concerns live here: the wire codes for command kinds,
//! the field names of the flat key-value inbound encoding, and the subset
//! of fields that participate in command identity. The command types
//! themselves stay pure data.
//!
//! An inbound request is a flat [`ParamMap`] with a required
//! [`FIELD_KIND`] entry; unknown or missing kinds decode to
//! [`CommandKind::NoOp`] and are dropped by the dispatcher before any
//! queue is touched.

use super::{Command, CommandKind, ParamMap};

/// Required wire field naming the command kind.
pub const FIELD_KIND: &str = "command-kind";
/// Numeric id of the object a command operates on.
pub const FIELD_TARGET_ID: &str = "target-id";
/// Status text for `update-status`.
pub const FIELD_TEXT: &str = "text";
/// Reply-target status id for `update-status`.
pub const FIELD_IN_REPLY_TO: &str = "in-reply-to";
/// Preference key for `apply-preference`.
pub const FIELD_PREF_KEY: &str = "pref-key";
/// Preference value for `apply-preference`.
pub const FIELD_PREF_VALUE: &str = "pref-value";
/// Preference scope for `apply-preference` ("user" or "global").
pub const FIELD_PREF_SCOPE: &str = "pref-scope";
/// Sync interval in seconds for `start-sync` / `restart-sync`.
pub const FIELD_INTERVAL: &str = "interval";

/// Kind ↔ wire code table. One row per kind; `NoOp` is the decode
/// fallback and deliberately has no inbound code of its own.
const KIND_CODES: &[(CommandKind, &str)] = &[
    (CommandKind::FetchTimeline, "fetch-timeline"),
    (CommandKind::FetchMessages, "fetch-messages"),
    (CommandKind::UpdateStatus, "update-status"),
    (CommandKind::DestroyStatus, "destroy-status"),
    (CommandKind::CreateFavorite, "create-favorite"),
    (CommandKind::DestroyFavorite, "destroy-favorite"),
    (CommandKind::RateLimitStatus, "rate-limit-status"),
    (CommandKind::StartSync, "start-sync"),
    (CommandKind::StopSync, "stop-sync"),
    (CommandKind::RestartSync, "restart-sync"),
    (CommandKind::ApplyPreference, "apply-preference"),
    (CommandKind::NotifyQueue, "notify-queue"),
    (CommandKind::ClearNotifications, "clear-notifications"),
    (CommandKind::PreferencesChanged, "preferences-changed"),
    (CommandKind::NoOp, "no-op"),
];

/// Returns the wire code for a kind.
pub fn kind_code(kind: CommandKind) -> &'static str {
    KIND_CODES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, code)| *code)
        .unwrap_or("no-op")
}

/// Decodes a wire code into a kind. Anything unrecognized is `NoOp`.
pub fn kind_from_code(code: &str) -> CommandKind {
    KIND_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(k, _)| *k)
        .unwrap_or(CommandKind::NoOp)
}

/// The param fields that make two commands of this kind the same semantic
/// action. Used by [`Command::identity_key`].
pub fn identity_fields(kind: CommandKind) -> &'static [&'static str] {
    match kind {
        CommandKind::UpdateStatus => &[FIELD_TEXT, FIELD_IN_REPLY_TO],
        CommandKind::ApplyPreference => &[FIELD_PREF_KEY, FIELD_PREF_SCOPE],
        _ => &[],
    }
}

/// The param fields carried by each kind, beyond the target id. Decoding
/// copies exactly these from the inbound message; everything else on the
/// wire is ignored.
fn carried_fields(kind: CommandKind) -> &'static [&'static str] {
    match kind {
        CommandKind::UpdateStatus => &[FIELD_TEXT, FIELD_IN_REPLY_TO],
        CommandKind::ApplyPreference => &[FIELD_PREF_KEY, FIELD_PREF_VALUE, FIELD_PREF_SCOPE],
        CommandKind::StartSync | CommandKind::RestartSync => &[FIELD_INTERVAL],
        _ => &[],
    }
}

/// Decodes an inbound flat key-value message into a command.
///
/// Missing target ids default to 0; handlers validate per-kind
/// requirements at execution time.
pub fn decode_request(message: &ParamMap) -> Command {
    let kind = message
        .get_str(FIELD_KIND)
        .map(kind_from_code)
        .unwrap_or(CommandKind::NoOp);

    let target_id = message
        .get_int(FIELD_TARGET_ID)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0);

    let mut params = ParamMap::new();
    for field in carried_fields(kind) {
        if let Some(value) = message.get(field) {
            params.insert(*field, value.clone());
        }
    }

    Command::new(kind, target_id, params)
}

/// Builds the wire message for an automatic-update trigger of `kind`.
///
/// The wake scheduler has no dedicated command code; it submits the same
/// fetch pair a manual refresh produces.
pub fn encode_request(kind: CommandKind) -> ParamMap {
    ParamMap::new().with(FIELD_KIND, kind_code(kind))
}
