//! Kind-specific command handlers.
//!
//! Each queued kind maps to one handler that drives the network client
//! and/or the data store and reports either a [`PassDelta`] (counters to
//! fold into the pass summary) or a [`CommandFailure`] (classified for
//! the retry policy). Handlers never panic the worker: every failure
//! path is a value.

use tracing::{debug, warn};

use crate::api::{ApiError, NetworkClient, RateLimit};
use crate::command::codec::{FIELD_IN_REPLY_TO, FIELD_TEXT};
use crate::command::{Command, CommandKind};
use crate::context::EngineContext;
use crate::observer::SyncErrorKind;
use crate::store::StoreError;

/// Statuses kept in the local cache; older entries are pruned after each
/// timeline sync.
const MAX_CACHED_STATUSES: usize = 500;

/// Counters accumulated by one command's successful execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassDelta {
    /// New timeline items stored.
    pub new_items: usize,
    /// New replies to the current user stored.
    pub new_replies: usize,
    /// New direct messages stored.
    pub new_messages: usize,
    /// Fresh rate-limit figures, when the command queried them.
    pub rate_limit: Option<RateLimit>,
}

/// A failed command attempt, classified for the retry policy.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    /// Whether a retry has any chance of succeeding.
    pub transient: bool,
    /// Terminal failure class surfaced to observers, if any.
    pub error_kind: Option<SyncErrorKind>,
    /// Human-readable detail.
    pub message: String,
}

impl CommandFailure {
    /// A terminal failure caused by unusable command parameters.
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            error_kind: None,
            message: message.into(),
        }
    }
}

impl From<ApiError> for CommandFailure {
    fn from(error: ApiError) -> Self {
        let error_kind = match &error {
            ApiError::Unauthorized => Some(SyncErrorKind::Authentication),
            ApiError::Malformed { .. } => Some(SyncErrorKind::MalformedPayload),
            _ => None,
        };
        Self {
            transient: error.is_transient(),
            error_kind,
            message: error.to_string(),
        }
    }
}

impl From<StoreError> for CommandFailure {
    fn from(error: StoreError) -> Self {
        Self {
            transient: false,
            error_kind: Some(SyncErrorKind::Store),
            message: error.to_string(),
        }
    }
}

/// Executes one command attempt against the collaborators.
///
/// `pending_after` is the number of commands still queued behind this
/// one, used by the notify-queue kind.
pub async fn execute<N: NetworkClient>(
    ctx: &EngineContext<N>,
    command: &Command,
    pending_after: usize,
) -> Result<PassDelta, CommandFailure> {
    match command.kind() {
        CommandKind::FetchTimeline => fetch_timeline(ctx).await,
        CommandKind::FetchMessages => fetch_messages(ctx).await,
        CommandKind::UpdateStatus => update_status(ctx, command).await,
        CommandKind::DestroyStatus => destroy_status(ctx, command).await,
        CommandKind::CreateFavorite => set_favorite(ctx, command, true).await,
        CommandKind::DestroyFavorite => set_favorite(ctx, command, false).await,
        CommandKind::RateLimitStatus => rate_limit_status(ctx).await,
        CommandKind::NotifyQueue => {
            ctx.notifier.queue_pending(pending_after);
            Ok(PassDelta::default())
        }
        CommandKind::ClearNotifications => {
            ctx.notifier.clear();
            Ok(PassDelta::default())
        }
        // Immediate kinds and no-ops are filtered out at dispatch; seeing
        // one here means a persisted snapshot predates that rule.
        other => {
            debug!(kind = %other, "Ignoring non-executable command in queue");
            Ok(PassDelta::default())
        }
    }
}

async fn fetch_timeline<N: NetworkClient>(
    ctx: &EngineContext<N>,
) -> Result<PassDelta, CommandFailure> {
    let since = ctx.store.latest_status_id()?;
    let statuses = ctx.network.fetch_timeline(since).await?;
    let outcome = ctx.store.upsert_statuses(&statuses, ctx.account.user_id)?;
    let pruned = ctx.store.prune(MAX_CACHED_STATUSES)?;
    debug!(
        fetched = statuses.len(),
        new = outcome.inserted,
        replies = outcome.replies,
        pruned,
        "Timeline fetched"
    );
    Ok(PassDelta {
        new_items: outcome.inserted,
        new_replies: outcome.replies,
        ..PassDelta::default()
    })
}

async fn fetch_messages<N: NetworkClient>(
    ctx: &EngineContext<N>,
) -> Result<PassDelta, CommandFailure> {
    let since = ctx.store.latest_message_id()?;
    let messages = ctx.network.fetch_messages(since).await?;
    let inserted = ctx.store.upsert_messages(&messages)?;
    debug!(fetched = messages.len(), new = inserted, "Messages fetched");
    Ok(PassDelta {
        new_messages: inserted,
        ..PassDelta::default()
    })
}

async fn update_status<N: NetworkClient>(
    ctx: &EngineContext<N>,
    command: &Command,
) -> Result<PassDelta, CommandFailure> {
    let Some(text) = command.params().get_str(FIELD_TEXT) else {
        return Err(CommandFailure::invalid("update-status without text"));
    };
    let in_reply_to = command
        .params()
        .get_int(FIELD_IN_REPLY_TO)
        .and_then(|n| u64::try_from(n).ok())
        .filter(|n| *n != 0);

    let status = ctx.network.post_status(text, in_reply_to).await?;
    ctx.store
        .upsert_statuses(std::slice::from_ref(&status), ctx.account.user_id)?;
    debug!(status_id = status.id, "Status posted");
    Ok(PassDelta::default())
}

async fn destroy_status<N: NetworkClient>(
    ctx: &EngineContext<N>,
    command: &Command,
) -> Result<PassDelta, CommandFailure> {
    if command.target_id() == 0 {
        return Err(CommandFailure::invalid("destroy-status without target id"));
    }
    ctx.network.delete_status(command.target_id()).await?;
    ctx.store.delete_status(command.target_id())?;
    debug!(status_id = command.target_id(), "Status destroyed");
    Ok(PassDelta::default())
}

async fn set_favorite<N: NetworkClient>(
    ctx: &EngineContext<N>,
    command: &Command,
    favorited: bool,
) -> Result<PassDelta, CommandFailure> {
    if command.target_id() == 0 {
        return Err(CommandFailure::invalid("favorite change without target id"));
    }
    if favorited {
        ctx.network.create_favorite(command.target_id()).await?;
    } else {
        ctx.network.destroy_favorite(command.target_id()).await?;
    }
    ctx.store.set_favorite(command.target_id(), favorited)?;
    debug!(
        status_id = command.target_id(),
        favorited, "Favorite updated"
    );
    Ok(PassDelta::default())
}

async fn rate_limit_status<N: NetworkClient>(
    ctx: &EngineContext<N>,
) -> Result<PassDelta, CommandFailure> {
    let rate_limit = ctx.network.rate_limit_status().await?;
    if rate_limit.remaining == 0 {
        warn!(limit = rate_limit.limit, "API quota exhausted");
    }
    Ok(PassDelta {
        rate_limit: Some(rate_limit),
        ..PassDelta::default()
    })
}
