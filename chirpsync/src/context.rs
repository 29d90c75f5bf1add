//! Engine context: explicit wiring of the engine's collaborators.
//!
//! There are no process-wide singletons. Everything the dispatcher,
//! executor, and scheduler need (account identity, collaborator handles,
//! the observer registry, the resource guard) is constructed once at
//! startup and passed down as one shared context value.

use std::sync::Arc;

use crate::api::NetworkClient;
use crate::guard::ResourceGuard;
use crate::notify::Notifier;
use crate::observer::ObserverRegistry;
use crate::prefs::Preferences;
use crate::store::DataStore;

/// Identity of the account this engine syncs for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountContext {
    /// The current user's remote id; replies are counted against it.
    pub user_id: u64,
    /// The current user's screen name, for logs.
    pub screen_name: String,
}

/// Shared handles for one running engine instance.
///
/// Generic over the network client so handlers await its native futures;
/// the remaining collaborators are object-safe trait handles.
pub struct EngineContext<N: NetworkClient> {
    /// Account the engine syncs for.
    pub account: AccountContext,
    /// Remote API client.
    pub network: Arc<N>,
    /// Local cache store.
    pub store: Arc<dyn DataStore>,
    /// Preference storage.
    pub prefs: Arc<dyn Preferences>,
    /// Host notification surface.
    pub notifier: Arc<dyn Notifier>,
    /// Attached UI observers.
    pub observers: Arc<ObserverRegistry>,
    /// Wake lock + connectivity gate.
    pub guard: Arc<ResourceGuard>,
}

impl<N: NetworkClient> EngineContext<N> {
    /// Assembles a context from its parts.
    pub fn new(
        account: AccountContext,
        network: Arc<N>,
        store: Arc<dyn DataStore>,
        prefs: Arc<dyn Preferences>,
        notifier: Arc<dyn Notifier>,
        guard: Arc<ResourceGuard>,
    ) -> Arc<Self> {
        Arc::new(Self {
            account,
            network,
            store,
            prefs,
            notifier,
            observers: Arc::new(ObserverRegistry::new()),
            guard,
        })
    }
}
