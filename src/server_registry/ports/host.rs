//! Host delegate and message transport ports.

use crate::server_registry::domain::{
    ConnectionState, DelegateResult, McpCollectionDefinition, McpServerDefinition, ServerLaunch,
    TransportResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::Level;

/// Per-transport strategy that knows how to start some kinds of server.
///
/// The registry tries delegates in descending [`Self::priority`] order and
/// uses the first whose [`Self::can_start`] accepts the definition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait McpHostDelegate: Send + Sync {
    /// Ordering weight; higher runs first.
    fn priority(&self) -> i32;

    /// Returns `true` when this delegate can run the definition.
    fn can_start(
        &self,
        collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
    ) -> bool;

    /// Substitutes the placeholders this delegate knows best, for example
    /// paths on a remote machine. The rest are left for the registry.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::server_registry::domain::DelegateError`] when
    /// substitution fails.
    async fn substitute_variables(
        &self,
        definition: &McpServerDefinition,
        launch: ServerLaunch,
    ) -> DelegateResult<ServerLaunch>;

    /// Starts a transport for the fully substituted launch.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::server_registry::domain::DelegateError`] when no
    /// transport can be created.
    async fn start(
        &self,
        collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
        launch: &ServerLaunch,
    ) -> DelegateResult<Arc<dyn McpMessageTransport>>;

    /// Resolves once the delegate's initial collection providers are known.
    async fn wait_for_initial_provider_promises(&self);
}

/// A log line emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportLog {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
}

impl TransportLog {
    /// Creates a log line.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Bidirectional JSON-RPC channel to one running server.
#[async_trait]
pub trait McpMessageTransport: Send + Sync {
    /// Observes the transport's own lifecycle.
    fn state(&self) -> watch::Receiver<ConnectionState>;

    /// Subscribes to messages received from the server.
    fn messages(&self) -> broadcast::Receiver<Value>;

    /// Subscribes to diagnostic output.
    fn logs(&self) -> broadcast::Receiver<TransportLog>;

    /// Sends one message to the server.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::server_registry::domain::TransportError`] when the
    /// message cannot be delivered.
    async fn send(&self, message: Value) -> TransportResult<()>;

    /// Shuts the transport down. Safe to call more than once.
    async fn stop(&self);
}
