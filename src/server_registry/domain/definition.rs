//! Server definitions contributed by collections.

use super::{CacheNonce, DefinitionId, ServerLaunch};
use crate::input_storage::ConfigurationTarget;
use crate::variables::WorkspaceFolder;
use serde::{Deserialize, Serialize};

/// Zero-based line and column span inside a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    /// First line of the span.
    pub start_line: u32,
    /// Column on the first line.
    pub start_column: u32,
    /// Last line of the span.
    pub end_line: u32,
    /// Column on the last line.
    pub end_column: u32,
}

impl TextRange {
    /// Creates a span covering whole lines `start_line..=end_line`.
    #[must_use]
    pub const fn lines(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            start_column: 0,
            end_line,
            end_column: 0,
        }
    }
}

/// A configuration file, optionally narrowed to a span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLocation {
    /// URI of the file.
    pub uri: String,
    /// Span inside the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

impl ConfigLocation {
    /// Points at the whole file.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            range: None,
        }
    }

    /// Narrows the location to `range`.
    #[must_use]
    pub const fn with_range(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// Where a definition's placeholders are resolved and their inputs stored.
///
/// The default policy has no target of its own and persists inputs at the
/// owning collection's configuration level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableReplacement {
    section: Option<String>,
    target: Option<ConfigurationTarget>,
    folder: Option<WorkspaceFolder>,
}

impl VariableReplacement {
    /// Creates a policy that persists inputs for `target`.
    #[must_use]
    pub const fn new(target: ConfigurationTarget) -> Self {
        Self {
            section: None,
            target: Some(target),
            folder: None,
        }
    }

    /// Reads `inputs` declarations from `<section>.inputs`.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Resolves folder-relative variables against `folder`.
    #[must_use]
    pub fn with_folder(mut self, folder: WorkspaceFolder) -> Self {
        self.folder = Some(folder);
        self
    }

    /// Settings section holding input declarations.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Configuration level the definition came from, if it names one.
    #[must_use]
    pub const fn target(&self) -> Option<ConfigurationTarget> {
        self.target
    }

    /// Workspace folder placeholders resolve against.
    #[must_use]
    pub const fn folder(&self) -> Option<&WorkspaceFolder> {
        self.folder.as_ref()
    }
}

/// Development-mode settings for a server under active development.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevModeConfig {
    /// Glob patterns whose changes restart the server.
    #[serde(default)]
    pub watch: Vec<String>,
    /// Debugger type to attach when starting in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_type: Option<String>,
}

/// One runnable server inside a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerDefinition {
    id: DefinitionId,
    label: String,
    cache_nonce: CacheNonce,
    launch: ServerLaunch,
    variable_replacement: Option<VariableReplacement>,
    dev_mode: Option<DevModeConfig>,
    origin: Option<ConfigLocation>,
}

impl McpServerDefinition {
    /// Creates a definition whose nonce is the fingerprint of `launch`.
    #[must_use]
    pub fn new(id: impl Into<DefinitionId>, label: impl Into<String>, launch: ServerLaunch) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            cache_nonce: CacheNonce::fingerprint(&launch),
            launch,
            variable_replacement: None,
            dev_mode: None,
            origin: None,
        }
    }

    /// Overrides the derived nonce.
    #[must_use]
    pub fn with_cache_nonce(mut self, nonce: CacheNonce) -> Self {
        self.cache_nonce = nonce;
        self
    }

    /// Enables placeholder substitution for the launch.
    #[must_use]
    pub fn with_variable_replacement(mut self, policy: VariableReplacement) -> Self {
        self.variable_replacement = Some(policy);
        self
    }

    /// Marks the server as under development.
    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: DevModeConfig) -> Self {
        self.dev_mode = Some(dev_mode);
        self
    }

    /// Records where the definition is declared.
    #[must_use]
    pub fn with_origin(mut self, origin: ConfigLocation) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the definition identifier.
    #[must_use]
    pub const fn id(&self) -> &DefinitionId {
        &self.id
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current content nonce.
    #[must_use]
    pub const fn cache_nonce(&self) -> &CacheNonce {
        &self.cache_nonce
    }

    /// Returns the unsubstituted launch.
    #[must_use]
    pub const fn launch(&self) -> &ServerLaunch {
        &self.launch
    }

    /// Returns the substitution policy, if any.
    #[must_use]
    pub const fn variable_replacement(&self) -> Option<&VariableReplacement> {
        self.variable_replacement.as_ref()
    }

    /// Returns development-mode settings, if any.
    #[must_use]
    pub const fn dev_mode(&self) -> Option<&DevModeConfig> {
        self.dev_mode.as_ref()
    }

    /// Returns where the definition is declared.
    #[must_use]
    pub const fn origin(&self) -> Option<&ConfigLocation> {
        self.origin.as_ref()
    }
}
