//! Command execution: the single background worker and its handlers.
//!
//! ```text
//! trigger ──► SyncEngine ──► guard gate ──► per-command handler
//!                │                              │
//!                │                              ├─► NetworkClient
//!                │                              └─► DataStore
//!                └─► retry policy ──► retry queue
//!                └─► pass summary ──► ObserverRegistry / Notifier
//! ```

mod handlers;
mod worker;

pub use handlers::{CommandFailure, PassDelta};
pub use worker::{SyncEngine, DEFAULT_RETRY_BUDGET};
