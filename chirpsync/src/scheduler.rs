//! Periodic wake trigger.
//!
//! An external-scheduler stand-in: at a configurable interval it submits
//! the automatic-update pair (fetch-timeline, fetch-messages) into the
//! daemon's request channel, whether or not any UI is open. The
//! `start-sync` / `stop-sync` / `restart-sync` immediate command kinds
//! are thin wrappers over [`WakeScheduler::start`], [`stop`], and
//! [`restart`].
//!
//! [`stop`]: WakeScheduler::stop
//! [`restart`]: WakeScheduler::restart

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::codec;
use crate::command::{CommandKind, ParamMap};

struct RunningSchedule {
    token: CancellationToken,
    interval_secs: u64,
}

/// Periodic submitter of automatic-update requests.
pub struct WakeScheduler {
    requests: mpsc::Sender<ParamMap>,
    state: Mutex<Option<RunningSchedule>>,
}

impl WakeScheduler {
    /// Creates a scheduler that submits into `requests`.
    pub fn new(requests: mpsc::Sender<ParamMap>) -> Self {
        Self {
            requests,
            state: Mutex::new(None),
        }
    }

    /// Starts the periodic trigger. Idempotent: if already running, the
    /// existing schedule is kept (use [`WakeScheduler::restart`] to change
    /// the interval).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, interval_secs: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(running) = state.as_ref() {
            debug!(
                interval_secs = running.interval_secs,
                "Periodic sync already running"
            );
            return;
        }

        let token = CancellationToken::new();
        let tick_token = token.clone();
        let requests = self.requests.clone();
        info!(interval_secs, "Periodic sync started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            // The first tick fires immediately; consume it so the first
            // automatic update happens one full interval from now.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = ticker.tick() => {
                        for kind in [CommandKind::FetchTimeline, CommandKind::FetchMessages] {
                            if requests.send(codec::encode_request(kind)).await.is_err() {
                                warn!("Request channel closed, periodic sync exiting");
                                return;
                            }
                        }
                        debug!("Automatic update submitted");
                    }
                }
            }
        });

        *state = Some(RunningSchedule {
            token,
            interval_secs,
        });
    }

    /// Stops the periodic trigger. Tolerates not running.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(running) = state.take() {
            running.token.cancel();
            info!("Periodic sync stopped");
        }
    }

    /// Restarts the periodic trigger with a new interval.
    pub fn restart(&self, interval_secs: u64) {
        self.stop();
        self.start(interval_secs);
    }

    /// Whether the trigger is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().is_some()
    }

    /// The interval of the running schedule, if any.
    pub fn current_interval(&self) -> Option<u64> {
        self.state.lock().unwrap().as_ref().map(|r| r.interval_secs)
    }
}

impl Drop for WakeScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.state.lock().unwrap().take() {
            running.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::codec::FIELD_KIND;

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = WakeScheduler::new(tx);

        scheduler.start(60);
        scheduler.start(120);
        assert_eq!(scheduler.current_interval(), Some(60));
        scheduler.stop();
    }

    #[tokio::test]
    async fn test_restart_changes_interval() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = WakeScheduler::new(tx);

        scheduler.start(60);
        scheduler.restart(120);
        assert_eq!(scheduler.current_interval(), Some(120));
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = WakeScheduler::new(tx);
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_submit_fetch_pair() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = WakeScheduler::new(tx);
        scheduler.start(30);

        // Advance past one interval; the fetch pair should arrive.
        tokio::time::sleep(Duration::from_secs(31)).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.get_str(FIELD_KIND), Some("fetch-timeline"));
        assert_eq!(second.get_str(FIELD_KIND), Some("fetch-messages"));

        scheduler.stop();
    }
}
