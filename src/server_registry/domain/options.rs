//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Which MCP servers the registry exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum McpAccess {
    /// MCP is disabled; no collections are visible.
    None,
    /// Every registered collection is visible.
    #[default]
    All,
}

/// Settings applied when constructing the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryOptions {
    /// Initial access level.
    pub access: McpAccess,
}

impl RegistryOptions {
    /// Sets the access level.
    #[must_use]
    pub const fn with_access(mut self, access: McpAccess) -> Self {
        self.access = access;
        self
    }
}
