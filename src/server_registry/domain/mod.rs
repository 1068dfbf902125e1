//! Domain model for server collections, trust, and connections.
//!
//! The registry domain models collections and their definitions, launch
//! configuration, remembered trust decisions, grouped trust prompts, and
//! connection states. Infrastructure concerns remain outside this boundary.

mod collection;
mod definition;
mod error;
mod ids;
mod interaction;
mod launch;
mod options;
mod state;
mod trust;

pub use collection::{
    CollectionAvailability, LazyCollection, LazyCollectionLoader, LazyCollectionState,
    McpCollectionDefinition, McpServerTrust, ServerDefinitions, ServerLaunchResolver,
};
pub use definition::{
    ConfigLocation, DevModeConfig, McpServerDefinition, TextRange, VariableReplacement,
};
pub use error::{
    DelegateError, DelegateResult, InteractionReason, LaunchError, RegistryError,
    RegistryResult, TransportError, TransportResult,
};
pub use ids::{CollectionId, ConnectionId, DefinitionId};
pub use interaction::{McpStartServerInteraction, TrustCandidate};
pub use launch::{CacheNonce, HttpLaunch, ServerLaunch, StdioLaunch};
pub use options::{McpAccess, RegistryOptions};
pub use state::{ConnectionState, ConnectionStatus};
pub use trust::{TrustNonceBearer, TrustPromptType, TrustedNonce};
