//! Remote service collaborator: the network client interface and the
//! objects it returns.
//!
//! The engine never talks HTTP itself; it calls a [`NetworkClient`]
//! implementation supplied by the host (the real OAuth'd API client in
//! production, mocks in tests, a simulator in the CLI). Every method
//! raises a typed [`ApiError`] instead of returning partial results.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures raised by the remote service or the transport under it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The service answered with an HTTP error status.
    #[error("service returned HTTP {status}")]
    Http {
        /// The HTTP status code.
        status: u16,
    },

    /// The service is throttling this client.
    #[error("rate limited by the service")]
    RateLimited,

    /// Credentials were rejected; retrying cannot succeed without user
    /// action.
    #[error("credentials rejected by the service")]
    Unauthorized,

    /// The response body could not be understood. Carries enough raw
    /// context to diagnose the payload.
    #[error("malformed response payload: {context}")]
    Malformed {
        /// Raw payload excerpt or parse diagnostics.
        context: String,
    },

    /// Connection-level failure below HTTP.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Server-side errors (5xx), throttling, and transport problems are
    /// transient; auth failures and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::RateLimited | ApiError::Transport(_) => true,
            ApiError::Http { status } => *status >= 500,
            ApiError::Unauthorized | ApiError::Malformed { .. } => false,
        }
    }
}

/// A single status (post) as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Remote id.
    pub id: u64,
    /// Author's remote user id.
    pub author_id: u64,
    /// Author's screen name.
    pub author_screen_name: String,
    /// Status text.
    pub text: String,
    /// Creation time at the service.
    pub created_at: DateTime<Utc>,
    /// Status this one replies to, if any.
    pub in_reply_to_status_id: Option<u64>,
    /// User this one replies to, if any.
    pub in_reply_to_user_id: Option<u64>,
    /// Whether the current user has favorited it.
    pub favorited: bool,
}

/// A direct message as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectMessage {
    /// Remote id.
    pub id: u64,
    /// Sender's remote user id.
    pub sender_id: u64,
    /// Sender's screen name.
    pub sender_screen_name: String,
    /// Message text.
    pub text: String,
    /// Creation time at the service.
    pub created_at: DateTime<Utc>,
}

/// Remaining API quota as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Calls remaining in the current window.
    pub remaining: u32,
    /// Total calls allowed per window.
    pub limit: u32,
    /// When the window resets.
    pub reset_at: i64,
}

/// The remote API surface the executor drives.
///
/// Implementations must be thread-safe; the engine serializes calls
/// through its single worker, but handles may be shared across tasks.
pub trait NetworkClient: Send + Sync + 'static {
    /// Fetches home-timeline statuses newer than `since_id`.
    fn fetch_timeline(
        &self,
        since_id: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Status>, ApiError>> + Send;

    /// Fetches direct messages newer than `since_id`.
    fn fetch_messages(
        &self,
        since_id: Option<u64>,
    ) -> impl Future<Output = Result<Vec<DirectMessage>, ApiError>> + Send;

    /// Posts a new status, optionally as a reply.
    fn post_status(
        &self,
        text: &str,
        in_reply_to: Option<u64>,
    ) -> impl Future<Output = Result<Status, ApiError>> + Send;

    /// Deletes a status owned by the current user.
    fn delete_status(&self, id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Marks a status as a favorite.
    fn create_favorite(&self, id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Removes a favorite mark.
    fn destroy_favorite(&self, id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Queries remaining API quota.
    fn rate_limit_status(&self) -> impl Future<Output = Result<RateLimit, ApiError>> + Send;
}
