//! Simulated remote service for development runs.
//!
//! Generates a deterministic stream of statuses and messages so the
//! engine can be exercised end to end without credentials or a network.
//! An optional failure rate injects transient errors to watch the retry
//! path at work.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use chirpsync::api::{ApiError, DirectMessage, NetworkClient, RateLimit, Status};

/// Fake service producing a fresh batch of content per fetch.
pub struct SimulatedNetwork {
    next_id: AtomicU64,
    calls: AtomicU64,
    /// Every n-th call fails with a transient error; 0 disables.
    fail_every: u64,
    /// Statuses returned per timeline fetch.
    batch_size: u64,
}

impl SimulatedNetwork {
    /// Creates a simulator; `fail_every` = 0 disables injected failures.
    pub fn new(fail_every: u64, batch_size: u64) -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            calls: AtomicU64::new(0),
            fail_every,
            batch_size,
        }
    }

    fn maybe_fail(&self) -> Result<(), ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && call % self.fail_every == 0 {
            return Err(ApiError::Http { status: 503 });
        }
        Ok(())
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl NetworkClient for SimulatedNetwork {
    async fn fetch_timeline(&self, _since_id: Option<u64>) -> Result<Vec<Status>, ApiError> {
        self.maybe_fail()?;
        Ok((0..self.batch_size)
            .map(|_| {
                let id = self.allocate_id();
                Status {
                    id,
                    author_id: 42,
                    author_screen_name: "simulated".into(),
                    text: format!("simulated status #{id}"),
                    created_at: Utc::now(),
                    in_reply_to_status_id: None,
                    in_reply_to_user_id: None,
                    favorited: false,
                }
            })
            .collect())
    }

    async fn fetch_messages(&self, _since_id: Option<u64>) -> Result<Vec<DirectMessage>, ApiError> {
        self.maybe_fail()?;
        let id = self.allocate_id();
        Ok(vec![DirectMessage {
            id,
            sender_id: 43,
            sender_screen_name: "simulated-dm".into(),
            text: format!("simulated message #{id}"),
            created_at: Utc::now(),
        }])
    }

    async fn post_status(&self, text: &str, in_reply_to: Option<u64>) -> Result<Status, ApiError> {
        self.maybe_fail()?;
        Ok(Status {
            id: self.allocate_id(),
            author_id: 1,
            author_screen_name: "me".into(),
            text: text.to_string(),
            created_at: Utc::now(),
            in_reply_to_status_id: in_reply_to,
            in_reply_to_user_id: None,
            favorited: false,
        })
    }

    async fn delete_status(&self, _id: u64) -> Result<(), ApiError> {
        self.maybe_fail()
    }

    async fn create_favorite(&self, _id: u64) -> Result<(), ApiError> {
        self.maybe_fail()
    }

    async fn destroy_favorite(&self, _id: u64) -> Result<(), ApiError> {
        self.maybe_fail()
    }

    async fn rate_limit_status(&self) -> Result<RateLimit, ApiError> {
        self.maybe_fail()?;
        Ok(RateLimit {
            remaining: 350,
            limit: 350,
            reset_at: Utc::now().timestamp() + 3600,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeline_batches_have_fresh_ids() {
        let network = SimulatedNetwork::new(0, 3);
        let first = network.fetch_timeline(None).await.unwrap();
        let second = network.fetch_timeline(None).await.unwrap();

        assert_eq!(first.len(), 3);
        assert!(second.iter().all(|s| s.id > first.last().unwrap().id));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let network = SimulatedNetwork::new(2, 1);
        assert!(network.fetch_timeline(None).await.is_ok());
        assert!(network.fetch_timeline(None).await.is_err());
        assert!(network.fetch_timeline(None).await.is_ok());
    }
}
