//! `chirpsync run` - run the sync daemon against the simulator.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chirpsync::config::{config_directory, ConfigFile};
use chirpsync::context::{AccountContext, EngineContext};
use chirpsync::daemon::SyncDaemon;
use chirpsync::guard::ResourceGuard;
use chirpsync::logging;
use chirpsync::notify::TracingNotifier;
use chirpsync::observer::TracingObserver;
use chirpsync::persist::IniKeyValueStore;
use chirpsync::prefs::{
    MemoryPreferences, PrefScope, Preferences, PREF_RETRY_DRAIN, PREF_SYNC_ENABLED,
    PREF_SYNC_INTERVAL,
};
use chirpsync::store::MemoryDataStore;

use crate::error::CliError;
use crate::simulation::SimulatedNetwork;

/// Arguments for `chirpsync run`.
#[derive(Args)]
pub struct RunArgs {
    /// Configuration file (default: ~/.chirpsync/config.ini).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the sync interval in seconds.
    #[arg(long)]
    interval: Option<u64>,

    /// Inject a transient failure on every n-th simulated call (0 = off).
    #[arg(long, default_value = "0")]
    fail_every: u64,

    /// Statuses per simulated timeline fetch.
    #[arg(long, default_value = "5")]
    batch_size: u64,
}

/// Runs the daemon until Ctrl-C.
pub async fn execute(args: RunArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let _logging_guard = logging::init_logging(&config.logging.directory, &config.logging.file)?;
    info!(version = chirpsync::VERSION, "chirpsync starting");

    let mut settings = config.sync_settings();
    if let Some(interval) = args.interval {
        settings.interval_secs = interval;
    }

    // Seed preference storage so preferences-changed re-reads see the
    // same values the config file provided.
    let prefs = Arc::new(MemoryPreferences::new());
    prefs.set(
        PrefScope::User,
        PREF_SYNC_INTERVAL,
        &settings.interval_secs.to_string(),
    );
    prefs.set(
        PrefScope::User,
        PREF_SYNC_ENABLED,
        &settings.enabled.to_string(),
    );
    prefs.set(PrefScope::User, PREF_RETRY_DRAIN, settings.retry_drain.code());

    let network = Arc::new(SimulatedNetwork::new(args.fail_every, args.batch_size));
    let store = Arc::new(MemoryDataStore::new());
    let ctx = EngineContext::new(
        AccountContext {
            user_id: config.account.user_id,
            screen_name: config.account.screen_name.clone(),
        },
        network,
        Arc::clone(&store) as _,
        prefs,
        Arc::new(TracingNotifier),
        Arc::new(ResourceGuard::unrestricted()),
    );
    ctx.observers.register(Arc::new(TracingObserver));

    let storage = Arc::new(IniKeyValueStore::open(
        config_directory().join("queues.ini"),
    )?);
    let (daemon, _requests, _idle) = SyncDaemon::new(ctx, storage, settings);

    let shutdown = CancellationToken::new();
    let daemon_handle = tokio::spawn(daemon.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    shutdown.cancel();
    let _ = daemon_handle.await;

    println!(
        "Stored {} statuses and {} messages this session.",
        store.status_count(),
        store.message_count()
    );
    Ok(())
}
