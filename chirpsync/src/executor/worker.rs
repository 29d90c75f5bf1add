//! The single background worker that drains the command queues.
//!
//! Exactly one worker pass runs at a time by construction: triggering is
//! a compare-and-swap on a running flag, so all network interaction is
//! strictly serialized. A pass holds the resource guard for its whole
//! duration, executes commands one at a time, applies the retry policy,
//! and fans a summary out to observers when it ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::handlers::{self, CommandFailure, PassDelta};
use crate::api::NetworkClient;
use crate::command::Command;
use crate::context::EngineContext;
use crate::observer::SyncErrorEvent;
use crate::queue::CommandQueue;

/// Retry budget assigned on a command's first failure.
pub const DEFAULT_RETRY_BUDGET: i32 = 9;

/// Counters accumulated over one worker pass.
#[derive(Debug, Clone, Copy, Default)]
struct PassSummary {
    new_items: usize,
    new_replies: usize,
    new_messages: usize,
    rate_limit: Option<crate::api::RateLimit>,
    executed: usize,
    failed: usize,
}

impl PassSummary {
    fn absorb(&mut self, delta: PassDelta) {
        self.new_items += delta.new_items;
        self.new_replies += delta.new_replies;
        self.new_messages += delta.new_messages;
        if delta.rate_limit.is_some() {
            self.rate_limit = delta.rate_limit;
        }
    }
}

/// The engine's single-worker executor.
pub struct SyncEngine<N: NetworkClient> {
    ctx: Arc<EngineContext<N>>,
    main_queue: Arc<CommandQueue>,
    retry_queue: Arc<CommandQueue>,
    running: AtomicBool,
    idle_tx: watch::Sender<bool>,
}

impl<N: NetworkClient> SyncEngine<N> {
    /// Creates the engine around its queues.
    ///
    /// The returned watch receiver reports `true` whenever a pass ends
    /// with both queues empty and no UI attached, which is the host's
    /// signal that the process may be torn down.
    pub fn new(
        ctx: Arc<EngineContext<N>>,
        main_queue: Arc<CommandQueue>,
        retry_queue: Arc<CommandQueue>,
    ) -> (Arc<Self>, watch::Receiver<bool>) {
        let (idle_tx, idle_rx) = watch::channel(false);
        let engine = Arc::new(Self {
            ctx,
            main_queue,
            retry_queue,
            running: AtomicBool::new(false),
            idle_tx,
        });
        (engine, idle_rx)
    }

    /// Whether a worker pass is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts a worker pass unless one is already running.
    ///
    /// Idempotent and cheap: with an empty main queue or a live worker
    /// this returns immediately.
    pub fn trigger(self: Arc<Self>) {
        if self.main_queue.is_empty() {
            return;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Worker already running, trigger ignored");
            return;
        }

        tokio::spawn(async move {
            self.run_pass().await;
            self.running.store(false, Ordering::Release);
            // Work may have arrived while the pass was winding down. Only
            // re-trigger while online; offline leftovers wait for the next
            // dispatch.
            if self.ctx.guard.is_online() && !self.main_queue.is_empty() {
                Arc::clone(&self).trigger();
            }
        });
    }

    async fn run_pass(&self) {
        let permit = self.ctx.guard.acquire();

        if !self.ctx.guard.is_online() {
            let pending = self.main_queue.len();
            warn!(pending, "Offline, deferring queued commands");
            self.ctx.notifier.queue_pending(pending);
            drop(permit);
            return;
        }

        self.ctx.observers.notify_loading(true);
        let mut summary = PassSummary::default();

        loop {
            if !self.ctx.guard.is_online() {
                warn!("Connectivity lost mid-pass, stopping");
                break;
            }
            let Some(mut command) = self.main_queue.try_dequeue() else {
                break;
            };

            command.begin_attempt();
            debug!(
                command = %command,
                attempt = command.attempt(),
                "Executing command"
            );

            let pending_after = self.main_queue.len();
            match handlers::execute(&self.ctx, &command, pending_after).await {
                Ok(delta) => {
                    summary.executed += 1;
                    summary.absorb(delta);
                }
                Err(failure) => {
                    summary.failed += 1;
                    self.handle_failure(command, failure);
                    // A failed attempt with connectivity gone means the
                    // rest of the queue would fail the same way.
                    if !self.ctx.guard.is_online() {
                        warn!("Offline after failure, stopping pass");
                        break;
                    }
                }
            }
        }

        drop(permit);
        self.finish_pass(summary);
    }

    /// Applies the retry policy to one failed attempt.
    fn handle_failure(&self, mut command: Command, failure: CommandFailure) {
        if let Some(error_kind) = failure.error_kind {
            self.ctx.observers.notify_error(&SyncErrorEvent {
                kind: error_kind,
                command: command.kind(),
                message: failure.message.clone(),
            });
        }

        if !command.kind().is_retryable() {
            warn!(command = %command, error = %failure.message, "Non-retryable command failed");
            return;
        }
        if !failure.transient {
            warn!(command = %command, error = %failure.message, "Terminal failure, not retrying");
            return;
        }

        if command.retries_left() < 0 {
            command.assign_budget(DEFAULT_RETRY_BUDGET);
        }
        if command.retries_left() > 0 {
            debug!(
                command = %command,
                retries_left = command.retries_left(),
                error = %failure.message,
                "Requeueing for retry"
            );
            self.retry_queue.try_enqueue(command);
        } else {
            warn!(
                command = %command,
                attempts = command.attempt(),
                error = %failure.message,
                "Retry budget exhausted, abandoning"
            );
        }
    }

    fn finish_pass(&self, summary: PassSummary) {
        self.ctx.observers.notify_loading(false);

        if summary.new_items > 0 {
            self.ctx.observers.notify_items(summary.new_items);
        }
        if summary.new_replies > 0 {
            self.ctx.observers.notify_replies(summary.new_replies);
        }
        if summary.new_messages > 0 {
            self.ctx.observers.notify_messages(summary.new_messages);
        }
        if let Some(rate_limit) = summary.rate_limit {
            self.ctx
                .observers
                .notify_rate_limit(rate_limit.remaining, rate_limit.limit);
        }
        if summary.new_items + summary.new_replies + summary.new_messages > 0 {
            self.ctx.notifier.sync_results(
                summary.new_items,
                summary.new_replies,
                summary.new_messages,
            );
        }

        info!(
            executed = summary.executed,
            failed = summary.failed,
            retry_queued = self.retry_queue.len(),
            "Worker pass finished"
        );

        // With nothing queued anywhere and no UI attached, the hosting
        // process has no reason to stay alive.
        let idle = self.main_queue.is_empty()
            && self.retry_queue.is_empty()
            && self.ctx.observers.is_empty();
        if idle {
            debug!("Queues drained and no observers attached");
        }
        let _ = self.idle_tx.send(idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, DirectMessage, RateLimit, Status};
    use crate::context::AccountContext;
    use crate::guard::ResourceGuard;
    use crate::notify::NullNotifier;
    use crate::prefs::MemoryPreferences;
    use crate::store::MemoryDataStore;

    /// Network stub for engine plumbing tests; never actually called.
    struct StubNetwork;

    impl NetworkClient for StubNetwork {
        async fn fetch_timeline(&self, _since_id: Option<u64>) -> Result<Vec<Status>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_messages(
            &self,
            _since_id: Option<u64>,
        ) -> Result<Vec<DirectMessage>, ApiError> {
            Ok(Vec::new())
        }

        async fn post_status(
            &self,
            _text: &str,
            _in_reply_to: Option<u64>,
        ) -> Result<Status, ApiError> {
            Err(ApiError::Transport("stub".into()))
        }

        async fn delete_status(&self, _id: u64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn create_favorite(&self, _id: u64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn destroy_favorite(&self, _id: u64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn rate_limit_status(&self) -> Result<RateLimit, ApiError> {
            Ok(RateLimit {
                remaining: 0,
                limit: 0,
                reset_at: 0,
            })
        }
    }

    fn stub_engine() -> (Arc<SyncEngine<StubNetwork>>, watch::Receiver<bool>) {
        let ctx = EngineContext::new(
            AccountContext {
                user_id: 1,
                screen_name: "stub".into(),
            },
            Arc::new(StubNetwork),
            Arc::new(MemoryDataStore::new()),
            Arc::new(MemoryPreferences::new()),
            Arc::new(NullNotifier),
            Arc::new(ResourceGuard::unrestricted()),
        );
        SyncEngine::new(
            ctx,
            Arc::new(CommandQueue::new("main")),
            Arc::new(CommandQueue::new("retry")),
        )
    }

    #[test]
    fn test_trigger_with_empty_queue_is_noop() {
        // No runtime needed: the empty-queue check returns before spawning.
        let (engine, _idle) = stub_engine();
        Arc::clone(&engine).trigger();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_idle_watch_starts_false() {
        let (_engine, idle) = stub_engine();
        assert!(!*idle.borrow());
    }

    #[test]
    fn test_pass_summary_absorb() {
        let mut summary = PassSummary::default();
        summary.absorb(PassDelta {
            new_items: 3,
            new_replies: 1,
            new_messages: 0,
            rate_limit: None,
        });
        summary.absorb(PassDelta {
            new_items: 2,
            new_replies: 0,
            new_messages: 4,
            rate_limit: Some(crate::api::RateLimit {
                remaining: 10,
                limit: 20,
                reset_at: 0,
            }),
        });

        assert_eq!(summary.new_items, 5);
        assert_eq!(summary.new_replies, 1);
        assert_eq!(summary.new_messages, 4);
        assert_eq!(summary.rate_limit.unwrap().remaining, 10);
    }
}
