//! Registry of server collections and host delegates.

use crate::input_storage::{McpRegistryInputStorage, SecretStore, StateStore, StorageScope};
use crate::server_registry::domain::{
    CollectionId, DefinitionId, LazyCollectionState, McpAccess, McpCollectionDefinition,
    McpServerDefinition, RegistryOptions,
};
use crate::server_registry::ports::{
    DevModeDebugging, McpHostDelegate, NotificationService, TrustPrompter,
};
use crate::variables::ConfigurationResolver;
use futures_util::future::join_all;
use mockable::Clock;
use std::cmp::Reverse;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const INPUT_EVENT_CAPACITY: usize = 16;

/// Collaborators the registry is built from.
#[derive(Clone)]
pub struct RegistryPorts {
    /// Resolves launch placeholders.
    pub resolver: Arc<dyn ConfigurationResolver>,
    /// Asks the user which servers to trust.
    pub trust_prompter: Arc<dyn TrustPrompter>,
    /// Reports launch failures.
    pub notifications: Arc<dyn NotificationService>,
    /// Plain input persistence.
    pub state_store: Arc<dyn StateStore>,
    /// Secret input persistence.
    pub secret_store: Arc<dyn SecretStore>,
    /// Debug-mode launch rewriting, when available.
    pub dev_mode: Option<Arc<dyn DevModeDebugging>>,
}

/// Removes a registered collection or delegate when disposed or dropped.
#[must_use = "dropping a registration unregisters it immediately"]
pub struct Registration {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Registration {
    fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unregisters now.
    pub fn dispose(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.release.is_some())
            .finish()
    }
}

pub(super) struct RegistryState {
    pub(super) collections: watch::Sender<Vec<Arc<McpCollectionDefinition>>>,
    pub(super) delegates: watch::Sender<Vec<Arc<dyn McpHostDelegate>>>,
    pub(super) ongoing_lazy_activations: watch::Sender<usize>,
    pub(super) access: watch::Sender<McpAccess>,
}

/// Tracks server collections and brokers connections to their servers.
///
/// Collections and delegates are registered by contributors and observed by
/// everyone else. [`Self::resolve_connection`] turns a definition into a
/// ready-to-start [`super::McpServerConnection`], checking trust and
/// substituting launch placeholders on the way.
pub struct McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    pub(super) state: Arc<RegistryState>,
    pub(super) resolver: Arc<dyn ConfigurationResolver>,
    pub(super) trust_prompter: Arc<dyn TrustPrompter>,
    pub(super) notifications: Arc<dyn NotificationService>,
    pub(super) dev_mode: Option<Arc<dyn DevModeDebugging>>,
    pub(super) workspace_inputs: McpRegistryInputStorage,
    pub(super) profile_inputs: McpRegistryInputStorage,
    pub(super) inputs_changed: broadcast::Sender<StorageScope>,
    pub(super) clock: Arc<C>,
}

impl<C> McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new(ports: RegistryPorts, options: RegistryOptions, clock: Arc<C>) -> Self {
        let (inputs_changed, _) = broadcast::channel(INPUT_EVENT_CAPACITY);
        let state = RegistryState {
            collections: watch::Sender::new(Vec::new()),
            delegates: watch::Sender::new(Vec::new()),
            ongoing_lazy_activations: watch::Sender::new(0),
            access: watch::Sender::new(options.access),
        };
        Self {
            state: Arc::new(state),
            workspace_inputs: McpRegistryInputStorage::new(
                StorageScope::Workspace,
                Arc::clone(&ports.state_store),
                Arc::clone(&ports.secret_store),
            ),
            profile_inputs: McpRegistryInputStorage::new(
                StorageScope::Profile,
                ports.state_store,
                ports.secret_store,
            ),
            resolver: ports.resolver,
            trust_prompter: ports.trust_prompter,
            notifications: ports.notifications,
            dev_mode: ports.dev_mode,
            inputs_changed,
            clock,
        }
    }

    /// Returns the current access level.
    #[must_use]
    pub fn access(&self) -> McpAccess {
        *self.state.access.borrow()
    }

    /// Changes the access level.
    pub fn set_access(&self, access: McpAccess) {
        info!(?access, "MCP access changed");
        self.state.access.send_replace(access);
    }

    /// Registers a host delegate.
    ///
    /// Delegates are kept in descending priority order; equal priorities keep
    /// registration order.
    pub fn register_delegate(&self, delegate: Arc<dyn McpHostDelegate>) -> Registration {
        let priority = delegate.priority();
        self.state.delegates.send_modify(|delegates| {
            delegates.push(Arc::clone(&delegate));
            delegates.sort_by_key(|registered| Reverse(registered.priority()));
        });
        debug!(priority, "registered MCP host delegate");

        let registry = Arc::downgrade(&self.state);
        Registration::new(move || {
            if let Some(state) = registry.upgrade() {
                state.delegates.send_modify(|delegates| {
                    delegates.retain(|registered| !Arc::ptr_eq(registered, &delegate));
                });
            }
        })
    }

    /// Returns the delegates in the order they are tried.
    #[must_use]
    pub fn delegates(&self) -> Vec<Arc<dyn McpHostDelegate>> {
        self.state.delegates.borrow().clone()
    }

    /// Registers a collection.
    ///
    /// A collection with the id of a registered lazy placeholder takes the
    /// placeholder's position. Otherwise it is inserted by presentation order.
    pub fn register_collection(&self, contributed: McpCollectionDefinition) -> Registration {
        let collection = Arc::new(contributed);
        let mut replaced = false;
        self.state.collections.send_modify(|collections| {
            let placeholder = collections
                .iter()
                .position(|existing| existing.is_lazy() && existing.id() == collection.id());
            if let Some(slot) = placeholder.and_then(|index| collections.get_mut(index)) {
                *slot = Arc::clone(&collection);
                replaced = true;
                return;
            }
            collections.push(Arc::clone(&collection));
            collections.sort_by_key(|registered| registered.presentation_order());
        });
        info!(
            collection_id = %collection.id(),
            lazy = collection.is_lazy(),
            replaced,
            "registered MCP server collection"
        );

        let registry: Weak<RegistryState> = Arc::downgrade(&self.state);
        Registration::new(move || {
            if let Some(state) = registry.upgrade() {
                state.collections.send_modify(|collections| {
                    collections.retain(|registered| !Arc::ptr_eq(registered, &collection));
                });
            }
        })
    }

    /// Returns the visible collections in presentation order.
    ///
    /// Empty while access is [`McpAccess::None`].
    #[must_use]
    pub fn collections(&self) -> Vec<Arc<McpCollectionDefinition>> {
        if self.access() == McpAccess::None {
            return Vec::new();
        }
        self.state.collections.borrow().clone()
    }

    /// Observes the registered collections, regardless of access.
    #[must_use]
    pub fn subscribe_collections(&self) -> watch::Receiver<Vec<Arc<McpCollectionDefinition>>> {
        self.state.collections.subscribe()
    }

    pub(super) fn find_collection(&self, id: &CollectionId) -> Option<Arc<McpCollectionDefinition>> {
        self.state
            .collections
            .borrow()
            .iter()
            .find(|collection| collection.id() == id)
            .cloned()
    }

    /// Looks up a collection and one of its definitions.
    #[must_use]
    pub fn server_definition(
        &self,
        collection_id: &CollectionId,
        definition_id: &DefinitionId,
    ) -> (
        Option<Arc<McpCollectionDefinition>>,
        Option<Arc<McpServerDefinition>>,
    ) {
        let collection = self.find_collection(collection_id);
        let definition = collection
            .as_ref()
            .and_then(|found| found.server_definitions().find(definition_id));
        (collection, definition)
    }

    /// Loads every lazy collection whose servers are not cached.
    ///
    /// Returns the collections that replaced their placeholders. Placeholders
    /// still present afterwards are stale: their loader's `removed` callback
    /// fires and they are left for the contributor to unregister.
    pub async fn discover_collections(&self) -> Vec<Arc<McpCollectionDefinition>> {
        let to_discover: Vec<Arc<McpCollectionDefinition>> = self
            .state
            .collections
            .borrow()
            .iter()
            .filter(|collection| {
                collection
                    .lazy_state()
                    .is_some_and(|lazy| !lazy.is_cached())
            })
            .cloned()
            .collect();
        if to_discover.is_empty() {
            return Vec::new();
        }

        debug!(count = to_discover.len(), "discovering lazy MCP collections");
        self.state
            .ongoing_lazy_activations
            .send_modify(|ongoing| *ongoing = ongoing.saturating_add(1));
        join_all(
            to_discover
                .iter()
                .filter_map(|collection| collection.lazy_state())
                .map(|lazy| lazy.load()),
        )
        .await;
        self.state
            .ongoing_lazy_activations
            .send_modify(|ongoing| *ongoing = ongoing.saturating_sub(1));

        let current = self.state.collections.borrow().clone();
        let mut found = Vec::new();
        for placeholder in &to_discover {
            let Some(record) = current
                .iter()
                .find(|collection| collection.id() == placeholder.id())
            else {
                continue;
            };
            if let Some(lazy) = record.lazy_state() {
                warn!(collection_id = %record.id(), "lazy MCP collection was not replaced after loading");
                lazy.notify_removed();
                continue;
            }
            found.push(Arc::clone(record));
        }
        found
    }

    /// Reports whether every collection's servers are known.
    #[must_use]
    pub fn lazy_collection_state(&self) -> LazyCollectionState {
        if self.access() == McpAccess::None {
            return LazyCollectionState::AllKnown;
        }
        if *self.state.ongoing_lazy_activations.borrow() > 0 {
            return LazyCollectionState::LoadingUnknown;
        }
        let unknown: Vec<Arc<McpCollectionDefinition>> = self
            .state
            .collections
            .borrow()
            .iter()
            .filter(|collection| {
                collection
                    .lazy_state()
                    .is_some_and(|lazy| !lazy.is_cached())
            })
            .cloned()
            .collect();
        if unknown.is_empty() {
            LazyCollectionState::AllKnown
        } else {
            LazyCollectionState::HasUnknown(unknown)
        }
    }

    /// Waits until every delegate knows its initial collection providers.
    pub async fn wait_for_initial_providers(&self) {
        let delegates = self.delegates();
        join_all(
            delegates
                .iter()
                .map(|delegate| delegate.wait_for_initial_provider_promises()),
        )
        .await;
    }

    pub(super) const fn input_storage(&self, scope: StorageScope) -> &McpRegistryInputStorage {
        match scope {
            StorageScope::Workspace => &self.workspace_inputs,
            StorageScope::Profile => &self.profile_inputs,
        }
    }
}

impl<C> fmt::Debug for McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpRegistry")
            .field("collections", &self.state.collections.borrow().len())
            .field("delegates", &self.state.delegates.borrow().len())
            .field("access", &self.access())
            .finish_non_exhaustive()
    }
}
