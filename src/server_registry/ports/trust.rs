//! Trust prompting and dev-mode ports.

use crate::server_registry::domain::{
    DefinitionId, DelegateResult, McpServerDefinition, ServerLaunch, TrustCandidate,
};
use async_trait::async_trait;

/// Asks the user which waiting servers to trust.
#[async_trait]
pub trait TrustPrompter: Send + Sync {
    /// Returns the approved definition ids, or `None` when cancelled.
    ///
    /// An empty list means the user declined every candidate.
    async fn choose_trusted(&self, candidates: Vec<TrustCandidate>) -> Option<Vec<DefinitionId>>;
}

/// Rewrites a launch so the server starts under a debugger.
#[async_trait]
pub trait DevModeDebugging: Send + Sync {
    /// Returns the launch to run in debug mode.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::server_registry::domain::DelegateError`] when the
    /// launch cannot be debugged.
    async fn transform(
        &self,
        definition: &McpServerDefinition,
        launch: ServerLaunch,
    ) -> DelegateResult<ServerLaunch>;
}
