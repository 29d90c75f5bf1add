//! The dispatch boundary: triage of inbound requests.
//!
//! Every producer (UI actions, periodic wake-ups, inter-process
//! requests) funnels through [`Dispatcher::submit`]. At most one submit
//! runs at a time; the caller is never blocked beyond quick in-memory
//! queue work plus any immediate command it asked for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::NetworkClient;
use crate::command::codec::{
    self, FIELD_INTERVAL, FIELD_PREF_KEY, FIELD_PREF_SCOPE, FIELD_PREF_VALUE,
};
use crate::command::{Command, CommandKind, ParamMap};
use crate::context::EngineContext;
use crate::executor::SyncEngine;
use crate::persist::{
    self, KeyValueStore, MAIN_QUEUE_STORAGE_KEY, RETRY_QUEUE_STORAGE_KEY,
};
use crate::prefs::{self, PrefScope};
use crate::queue::CommandQueue;
use crate::scheduler::WakeScheduler;
use crate::settings::{RetryDrainPolicy, SyncSettings};

/// Single synchronized entry point for new work.
pub struct Dispatcher<N: NetworkClient> {
    ctx: Arc<EngineContext<N>>,
    main_queue: Arc<CommandQueue>,
    retry_queue: Arc<CommandQueue>,
    engine: Arc<SyncEngine<N>>,
    scheduler: Arc<WakeScheduler>,
    storage: Arc<dyn KeyValueStore>,
    /// Serializes submits; also guards the one-shot restore.
    gate: Mutex<bool>,
    prefs_dirty: AtomicBool,
    settings: StdMutex<SyncSettings>,
}

impl<N: NetworkClient> Dispatcher<N> {
    /// Wires a dispatcher over the engine's shared parts.
    pub fn new(
        ctx: Arc<EngineContext<N>>,
        main_queue: Arc<CommandQueue>,
        retry_queue: Arc<CommandQueue>,
        engine: Arc<SyncEngine<N>>,
        scheduler: Arc<WakeScheduler>,
        storage: Arc<dyn KeyValueStore>,
        settings: SyncSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            main_queue,
            retry_queue,
            engine,
            scheduler,
            storage,
            gate: Mutex::new(false),
            prefs_dirty: AtomicBool::new(false),
            settings: StdMutex::new(settings),
        })
    }

    /// Current sync settings as last read from preferences.
    pub fn settings(&self) -> SyncSettings {
        *self.settings.lock().unwrap()
    }

    /// Marks sync settings stale; the next submit re-reads them.
    pub fn mark_preferences_changed(&self) {
        self.prefs_dirty.store(true, Ordering::Release);
    }

    /// Receives one inbound request.
    ///
    /// Immediate kinds execute synchronously here and never enqueue;
    /// everything else is deduplicated into the main queue and the worker
    /// is triggered. Duplicates and overflow are logged and dropped; the
    /// caller gets no signal either way.
    pub async fn submit(&self, request: ParamMap) {
        let mut restored = self.gate.lock().await;

        if self.prefs_dirty.swap(false, Ordering::AcqRel) {
            self.reload_settings();
        }

        if !*restored {
            *restored = true;
            self.restore_persisted_queues();
        }

        // Previously failed work gets its shot once the pipeline is idle.
        // New work arriving while the main queue is busy goes behind it;
        // under the default policy a steady producer can starve retries
        // indefinitely (see DESIGN.md).
        let drain_now = match self.settings().retry_drain {
            RetryDrainPolicy::WhenIdle => self.main_queue.is_empty(),
            RetryDrainPolicy::Eager => true,
        };
        if drain_now && !self.retry_queue.is_empty() {
            let retried = self.retry_queue.drain();
            info!(count = retried.len(), "Folding retry queue into main queue");
            for command in retried {
                self.main_queue.try_enqueue(command);
            }
        }

        let command = codec::decode_request(&request);
        match command.kind() {
            CommandKind::NoOp => {
                debug!("Undecodable request dropped");
                return;
            }
            kind if kind.is_immediate() => {
                self.run_immediate(&command);
                return;
            }
            _ => {}
        }

        self.main_queue.try_enqueue(command);
        drop(restored);
        Arc::clone(&self.engine).trigger();
    }

    /// Executes an immediate kind on the caller's side of the queue.
    fn run_immediate(&self, command: &Command) {
        match command.kind() {
            CommandKind::ApplyPreference => {
                let params = command.params();
                let (Some(key), Some(value)) = (
                    params.get_str(FIELD_PREF_KEY),
                    params.get_str(FIELD_PREF_VALUE),
                ) else {
                    warn!("apply-preference without key/value dropped");
                    return;
                };
                let scope = params
                    .get_str(FIELD_PREF_SCOPE)
                    .map(PrefScope::from_code)
                    .unwrap_or_default();
                self.ctx.prefs.set(scope, key, value);
                debug!(key, scope = scope.code(), "Preference applied");
            }
            CommandKind::StartSync => {
                self.scheduler.start(self.requested_interval(command));
            }
            CommandKind::StopSync => {
                self.scheduler.stop();
            }
            CommandKind::RestartSync => {
                self.scheduler.restart(self.requested_interval(command));
            }
            CommandKind::PreferencesChanged => {
                self.mark_preferences_changed();
            }
            other => {
                debug!(kind = %other, "Kind is not immediate");
            }
        }
    }

    fn requested_interval(&self, command: &Command) -> u64 {
        command
            .params()
            .get_int(FIELD_INTERVAL)
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(|| self.settings().interval_secs)
    }

    /// Re-reads sync settings from preferences and applies them to the
    /// wake scheduler.
    fn reload_settings(&self) {
        let fresh = prefs::read_sync_settings(&*self.ctx.prefs);
        let stale = {
            let mut slot = self.settings.lock().unwrap();
            std::mem::replace(&mut *slot, fresh)
        };
        info!(
            interval_secs = fresh.interval_secs,
            enabled = fresh.enabled,
            "Sync settings reloaded"
        );

        if !fresh.enabled {
            self.scheduler.stop();
        } else if !self.scheduler.is_running() || stale.interval_secs != fresh.interval_secs {
            self.scheduler.restart(fresh.interval_secs);
        }
    }

    /// One-shot restore of both queues on the first submit after a cold
    /// start. Main queue first so restored retry work keeps its relative
    /// position behind it.
    fn restore_persisted_queues(&self) {
        for (storage_key, queue) in [
            (MAIN_QUEUE_STORAGE_KEY, &self.main_queue),
            (RETRY_QUEUE_STORAGE_KEY, &self.retry_queue),
        ] {
            match persist::restore_queue(&*self.storage, storage_key) {
                Ok(commands) => {
                    for command in commands {
                        queue.try_enqueue(command);
                    }
                }
                Err(error) => {
                    warn!(storage_key, %error, "Queue restore failed, starting empty");
                }
            }
        }
    }
}
