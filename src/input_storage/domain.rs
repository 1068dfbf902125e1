//! Storage scopes and configuration targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition that persisted inputs belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Shared by everything opened in the current workspace.
    Workspace,
    /// Shared by every workspace of the current user profile.
    Profile,
}

impl StorageScope {
    /// Returns the canonical scope name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration level a server definition was declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigurationTarget {
    /// Application-wide defaults.
    Application,
    /// User settings.
    User,
    /// User settings on the local machine.
    UserLocal,
    /// User settings on a remote machine.
    UserRemote,
    /// Workspace settings.
    Workspace,
    /// Settings of one folder in a multi-root workspace.
    WorkspaceFolder,
    /// Built-in defaults.
    Default,
    /// In-memory overrides.
    Memory,
}

impl ConfigurationTarget {
    /// Scope that inputs resolved for this target are persisted under.
    #[must_use]
    pub const fn storage_scope(self) -> StorageScope {
        match self {
            Self::Workspace | Self::WorkspaceFolder => StorageScope::Workspace,
            Self::Application
            | Self::User
            | Self::UserLocal
            | Self::UserRemote
            | Self::Default
            | Self::Memory => StorageScope::Profile,
        }
    }
}
