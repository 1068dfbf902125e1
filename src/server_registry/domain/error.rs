//! Error types for the server registry.

use super::{CollectionId, DefinitionId};
use crate::input_storage::InputStorageError;
use crate::variables::VariableError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why a call that forbade user interaction could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionReason {
    /// The server needs the user's trust approval.
    ServerTrust,
    /// The launch has placeholders only the user can fill.
    Variables,
}

impl fmt::Display for InteractionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ServerTrust => "server trust",
            Self::Variables => "variables",
        })
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by [`crate::server_registry::services::McpRegistry`].
///
/// Trust denial and cancellation are not errors; they resolve to no
/// connection.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No collection is registered under the id.
    #[error("MCP server collection {0} not found")]
    CollectionNotFound(CollectionId),

    /// The collection has no definition with the id.
    #[error("MCP server {definition_id} not found in collection {collection_id}")]
    DefinitionNotFound {
        /// Collection searched.
        collection_id: CollectionId,
        /// Missing definition.
        definition_id: DefinitionId,
    },

    /// No registered delegate accepts the definition.
    #[error("no delegate can start MCP server {definition_id} of collection {collection_id}")]
    NoDelegate {
        /// Owning collection.
        collection_id: CollectionId,
        /// Definition nobody can start.
        definition_id: DefinitionId,
    },

    /// The caller forbade prompting but a prompt was needed.
    #[error("user interaction required for {0}")]
    InteractionRequired(InteractionReason),

    /// Saved inputs could not be read or written.
    #[error(transparent)]
    InputStorage(#[from] InputStorageError),

    /// Editing a saved input failed to resolve.
    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Result type for delegate operations.
pub type DelegateResult<T> = Result<T, DelegateError>;

/// Errors returned by host delegates and launch resolvers.
#[derive(Debug, Clone, Error)]
pub enum DelegateError {
    /// The delegate cannot run this launch.
    #[error("unsupported launch for MCP server {definition_id}: {reason}")]
    Unsupported {
        /// Definition being started.
        definition_id: DefinitionId,
        /// Reason string.
        reason: String,
    },

    /// Generic runtime failure.
    #[error("MCP delegate error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl DelegateError {
    /// Wraps a runtime error from a delegate.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors returned by message transports.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport is not running.
    #[error("transport is not running")]
    NotRunning,

    /// Generic transport failure.
    #[error("transport error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps a runtime error from a transport.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}

/// Failures while turning a definition into a runnable launch.
///
/// Everything except [`Self::InteractionRequired`] is reported to the user
/// and resolves to no connection.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The caller forbade prompting but a prompt was needed.
    #[error("user interaction required for {0}")]
    InteractionRequired(InteractionReason),

    /// The delegate or launch resolver failed.
    #[error(transparent)]
    Delegate(#[from] DelegateError),

    /// A placeholder could not be resolved.
    #[error(transparent)]
    Variable(#[from] VariableError),

    /// Saved inputs could not be read or written.
    #[error(transparent)]
    InputStorage(#[from] InputStorageError),

    /// The substituted configuration is no longer a valid launch.
    #[error("resolved launch is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
