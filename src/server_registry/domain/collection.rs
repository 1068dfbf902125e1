//! Server collections and their contributor-owned definition lists.

use super::{CollectionId, DefinitionId, DelegateResult, McpServerDefinition, ServerLaunch};
use crate::input_storage::{ConfigurationTarget, StorageScope};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// How servers in a collection earn trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum McpServerTrust {
    /// Servers run without asking.
    Trusted,
    /// Servers run once the user approved their current nonce.
    TrustedOnNonce,
}

/// Observable list of definitions, mutated by the contributor that owns it.
///
/// Clones share the same list. The registry only reads it.
#[derive(Clone)]
pub struct ServerDefinitions {
    sender: Arc<watch::Sender<Vec<Arc<McpServerDefinition>>>>,
}

impl ServerDefinitions {
    /// Creates a list holding `definitions`.
    #[must_use]
    pub fn new(definitions: impl IntoIterator<Item = McpServerDefinition>) -> Self {
        Self {
            sender: Arc::new(watch::Sender::new(
                definitions.into_iter().map(Arc::new).collect(),
            )),
        }
    }

    /// Returns a snapshot of the current definitions.
    #[must_use]
    pub fn get(&self) -> Vec<Arc<McpServerDefinition>> {
        self.sender.borrow().clone()
    }

    /// Finds a definition by id.
    #[must_use]
    pub fn find(&self, id: &DefinitionId) -> Option<Arc<McpServerDefinition>> {
        self.sender
            .borrow()
            .iter()
            .find(|definition| definition.id() == id)
            .cloned()
    }

    /// Replaces every definition.
    pub fn replace(&self, definitions: impl IntoIterator<Item = McpServerDefinition>) {
        self.sender
            .send_replace(definitions.into_iter().map(Arc::new).collect());
    }

    /// Adds or replaces the definition with the same id.
    pub fn upsert(&self, definition: McpServerDefinition) {
        self.sender.send_modify(|definitions| {
            let updated = Arc::new(definition);
            let position = definitions
                .iter()
                .position(|existing| existing.id() == updated.id());
            if let Some(slot) = position.and_then(|index| definitions.get_mut(index)) {
                *slot = updated;
                return;
            }
            definitions.push(updated);
        });
    }

    /// Subscribes to list changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<McpServerDefinition>>> {
        self.sender.subscribe()
    }
}

impl Default for ServerDefinitions {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for ServerDefinitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<DefinitionId> = self
            .sender
            .borrow()
            .iter()
            .map(|definition| definition.id().clone())
            .collect();
        f.debug_tuple("ServerDefinitions").field(&ids).finish()
    }
}

/// Loader behind a placeholder collection whose servers are not known yet.
#[async_trait]
pub trait LazyCollectionLoader: Send + Sync {
    /// Loads the real collection, which registers itself under the same id.
    async fn load(&self);

    /// Called when loading finished without the real collection appearing.
    fn removed(&self);
}

/// Placeholder state of a collection that must be loaded before use.
pub struct LazyCollection {
    is_cached: bool,
    loader: Arc<dyn LazyCollectionLoader>,
    removal_notified: AtomicBool,
}

impl LazyCollection {
    /// Creates lazy state. `is_cached` marks placeholders whose definitions
    /// are already known from a previous session.
    #[must_use]
    pub fn new(loader: Arc<dyn LazyCollectionLoader>, is_cached: bool) -> Self {
        Self {
            is_cached,
            loader,
            removal_notified: AtomicBool::new(false),
        }
    }

    /// Returns `true` when the definitions are known from a cache.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.is_cached
    }

    /// Runs the loader.
    pub async fn load(&self) {
        self.loader.load().await;
    }

    /// Tells the loader the placeholder is stale. Fires at most once.
    pub fn notify_removed(&self) {
        if !self.removal_notified.swap(true, Ordering::AcqRel) {
            self.loader.removed();
        }
    }
}

impl fmt::Debug for LazyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCollection")
            .field("is_cached", &self.is_cached)
            .field("removal_notified", &self.removal_notified)
            .finish_non_exhaustive()
    }
}

/// Whether a collection is ready to use or must be loaded first.
#[derive(Debug)]
pub enum CollectionAvailability {
    /// Definitions are authoritative.
    Concrete,
    /// A placeholder that must be loaded before use.
    Lazy(LazyCollection),
}

/// Computes a launch for a definition instead of its static launch.
#[async_trait]
pub trait ServerLaunchResolver: Send + Sync {
    /// Returns the launch, or `None` when the user cancelled.
    ///
    /// # Errors
    ///
    /// Returns a [`super::DelegateError`] when the launch cannot be computed.
    async fn resolve_server_launch(
        &self,
        definition: &McpServerDefinition,
    ) -> DelegateResult<Option<ServerLaunch>>;
}

/// A group of server definitions contributed by one source.
pub struct McpCollectionDefinition {
    id: CollectionId,
    label: String,
    server_definitions: ServerDefinitions,
    trust_behavior: McpServerTrust,
    config_target: ConfigurationTarget,
    order: Option<i32>,
    origin: Option<String>,
    source: Option<String>,
    launch_resolver: Option<Arc<dyn ServerLaunchResolver>>,
    availability: CollectionAvailability,
}

impl McpCollectionDefinition {
    /// Creates an empty concrete collection scoped to the workspace.
    #[must_use]
    pub fn new(
        id: impl Into<CollectionId>,
        label: impl Into<String>,
        trust_behavior: McpServerTrust,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            server_definitions: ServerDefinitions::default(),
            trust_behavior,
            config_target: ConfigurationTarget::Workspace,
            order: None,
            origin: None,
            source: None,
            launch_resolver: None,
            availability: CollectionAvailability::Concrete,
        }
    }

    /// Uses `definitions` as the collection's list.
    #[must_use]
    pub fn with_definitions(mut self, definitions: ServerDefinitions) -> Self {
        self.server_definitions = definitions;
        self
    }

    /// Sets the configuration level the collection is declared at. Inputs
    /// of definitions whose policy names no target are stored at this level.
    #[must_use]
    pub const fn with_config_target(mut self, target: ConfigurationTarget) -> Self {
        self.config_target = target;
        self
    }

    /// Sets the presentation order; lower sorts first.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Records the configuration file the collection is read from.
    #[must_use]
    pub fn with_origin(mut self, uri: impl Into<String>) -> Self {
        self.origin = Some(uri.into());
        self
    }

    /// Names the contributor shown next to the collection's servers.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Computes launches through `resolver`.
    #[must_use]
    pub fn with_launch_resolver(mut self, resolver: Arc<dyn ServerLaunchResolver>) -> Self {
        self.launch_resolver = Some(resolver);
        self
    }

    /// Turns the collection into a placeholder loaded by `loader`.
    #[must_use]
    pub fn lazy(mut self, loader: Arc<dyn LazyCollectionLoader>, is_cached: bool) -> Self {
        self.availability = CollectionAvailability::Lazy(LazyCollection::new(loader, is_cached));
        self
    }

    /// Returns the collection identifier.
    #[must_use]
    pub const fn id(&self) -> &CollectionId {
        &self.id
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the contributor-owned definition list.
    #[must_use]
    pub const fn server_definitions(&self) -> &ServerDefinitions {
        &self.server_definitions
    }

    /// Returns the trust behaviour.
    #[must_use]
    pub const fn trust_behavior(&self) -> McpServerTrust {
        self.trust_behavior
    }

    /// Returns the storage scope inputs of this collection default to.
    #[must_use]
    pub const fn scope(&self) -> StorageScope {
        self.config_target().storage_scope()
    }

    /// Returns the configuration level.
    #[must_use]
    pub const fn config_target(&self) -> ConfigurationTarget {
        self.config_target
    }

    /// Returns the presentation order, `0` when unset.
    #[must_use]
    pub fn presentation_order(&self) -> i32 {
        self.order.unwrap_or_default()
    }

    /// Returns the configuration file URI.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Returns the contributor label.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns the custom launch resolver.
    #[must_use]
    pub fn launch_resolver(&self) -> Option<&Arc<dyn ServerLaunchResolver>> {
        self.launch_resolver.as_ref()
    }

    /// Returns whether the collection is concrete or lazy.
    #[must_use]
    pub const fn availability(&self) -> &CollectionAvailability {
        &self.availability
    }

    /// Returns the lazy state when the collection is a placeholder.
    #[must_use]
    pub const fn lazy_state(&self) -> Option<&LazyCollection> {
        match &self.availability {
            CollectionAvailability::Lazy(lazy) => Some(lazy),
            CollectionAvailability::Concrete => None,
        }
    }

    /// Returns `true` for placeholder collections.
    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        matches!(self.availability, CollectionAvailability::Lazy(_))
    }
}

impl fmt::Debug for McpCollectionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpCollectionDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("server_definitions", &self.server_definitions)
            .field("trust_behavior", &self.trust_behavior)
            .field("config_target", &self.config_target)
            .field("order", &self.order)
            .field("availability", &self.availability)
            .finish_non_exhaustive()
    }
}

/// Whether every registered collection's servers are known.
#[derive(Debug, Clone)]
pub enum LazyCollectionState {
    /// Some placeholders were never loaded.
    HasUnknown(Vec<Arc<McpCollectionDefinition>>),
    /// Discovery is running.
    LoadingUnknown,
    /// Every collection is concrete or cached.
    AllKnown,
}
