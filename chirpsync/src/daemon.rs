//! The sync daemon: channel front-end and process lifecycle.
//!
//! Producers (UI bindings, the wake scheduler, inter-process glue) send
//! flat key-value requests on an `mpsc` channel; the daemon forwards them
//! to the dispatcher one at a time. On shutdown it persists whatever
//! remains in both queues so no accepted work is lost to a process kill.
//!
//! ```text
//! UI ─┐
//! IPC ─┼─► mpsc ─► SyncDaemon::run ─► Dispatcher ─► queues ─► SyncEngine
//! wake ┘                │
//!                       └─ shutdown: persist main + retry queues
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::NetworkClient;
use crate::command::ParamMap;
use crate::context::EngineContext;
use crate::dispatch::Dispatcher;
use crate::executor::SyncEngine;
use crate::persist::{
    self, KeyValueStore, MAIN_QUEUE_STORAGE_KEY, RETRY_QUEUE_STORAGE_KEY,
};
use crate::queue::CommandQueue;
use crate::scheduler::WakeScheduler;
use crate::settings::SyncSettings;

/// Default capacity of the inbound request channel.
pub const DEFAULT_REQUEST_CHANNEL_CAPACITY: usize = 64;

/// A running engine's front-end.
pub struct SyncDaemon<N: NetworkClient> {
    dispatcher: Arc<Dispatcher<N>>,
    scheduler: Arc<WakeScheduler>,
    main_queue: Arc<CommandQueue>,
    retry_queue: Arc<CommandQueue>,
    storage: Arc<dyn KeyValueStore>,
    request_rx: mpsc::Receiver<ParamMap>,
    settings: SyncSettings,
}

impl<N: NetworkClient> SyncDaemon<N> {
    /// Assembles the full engine around a context and durable storage.
    ///
    /// Returns the daemon, the request sender producers clone, and the
    /// idle watch (`true` once both queues are empty with no UI
    /// attached).
    pub fn new(
        ctx: Arc<EngineContext<N>>,
        storage: Arc<dyn KeyValueStore>,
        settings: SyncSettings,
    ) -> (Self, mpsc::Sender<ParamMap>, watch::Receiver<bool>) {
        let (request_tx, request_rx) = mpsc::channel(DEFAULT_REQUEST_CHANNEL_CAPACITY);

        let main_queue = Arc::new(CommandQueue::new("main"));
        let retry_queue = Arc::new(CommandQueue::new("retry"));
        let (engine, idle_rx) = SyncEngine::new(
            Arc::clone(&ctx),
            Arc::clone(&main_queue),
            Arc::clone(&retry_queue),
        );
        let scheduler = Arc::new(WakeScheduler::new(request_tx.clone()));
        let dispatcher = Dispatcher::new(
            ctx,
            Arc::clone(&main_queue),
            Arc::clone(&retry_queue),
            engine,
            Arc::clone(&scheduler),
            Arc::clone(&storage),
            settings,
        );

        let daemon = Self {
            dispatcher,
            scheduler,
            main_queue,
            retry_queue,
            storage,
            request_rx,
            settings,
        };
        (daemon, request_tx, idle_rx)
    }

    /// Direct handle to the dispatcher for in-process producers that
    /// bypass the channel.
    pub fn dispatcher(&self) -> Arc<Dispatcher<N>> {
        Arc::clone(&self.dispatcher)
    }

    /// Runs until `shutdown` is cancelled, then persists both queues.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Sync daemon starting");

        if self.settings.enabled {
            self.scheduler.start(self.settings.interval_secs);
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Sync daemon shutting down");
                    break;
                }

                request = self.request_rx.recv() => {
                    match request {
                        Some(request) => self.dispatcher.submit(request).await,
                        None => {
                            warn!("All request senders dropped, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        self.scheduler.stop();
        self.persist_queues();
        info!("Sync daemon stopped");
    }

    fn persist_queues(&self) {
        for (storage_key, queue) in [
            (MAIN_QUEUE_STORAGE_KEY, &self.main_queue),
            (RETRY_QUEUE_STORAGE_KEY, &self.retry_queue),
        ] {
            let snapshot = queue.snapshot();
            if let Err(error) = persist::save_queue(&*self.storage, storage_key, &snapshot) {
                warn!(storage_key, %error, "Failed to persist queue at shutdown");
            }
        }
    }
}
