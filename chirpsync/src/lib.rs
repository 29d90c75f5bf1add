//! chirpsync: background sync engine for a microblogging client.
//!
//! The engine serializes all interaction with the remote service through
//! two bounded FIFO queues and a single background worker. Work survives
//! process death via durable queue snapshots, transient failures retry
//! against a per-command budget, duplicate requests collapse by command
//! identity, and completion events fan out to whatever UI is attached.
//!
//! # High-Level API
//!
//! ```ignore
//! use chirpsync::context::{AccountContext, EngineContext};
//! use chirpsync::daemon::SyncDaemon;
//!
//! let ctx = EngineContext::new(account, network, store, prefs, notifier, guard);
//! let (daemon, requests, idle) = SyncDaemon::new(ctx, storage, settings);
//!
//! tokio::spawn(daemon.run(shutdown.clone()));
//!
//! // Any producer submits flat key-value requests:
//! requests.send(request).await?;
//! ```

pub mod api;
pub mod command;
pub mod config;
pub mod context;
pub mod daemon;
pub mod dispatch;
pub mod executor;
pub mod guard;
pub mod logging;
pub mod notify;
pub mod observer;
pub mod persist;
pub mod prefs;
pub mod queue;
pub mod scheduler;
pub mod settings;
pub mod store;

/// Version of the chirpsync library and CLI.
///
/// Synchronized across all workspace members; defined in `Cargo.toml`
/// and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
