//! Declared interactive inputs (`${input:ID}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of an `inputs` configuration array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredInput {
    /// Identifier referenced as `${input:<id>}`.
    pub id: String,
    /// How the value is collected.
    #[serde(flatten)]
    pub kind: InputKind,
}

impl ConfiguredInput {
    /// Creates a free-text prompt input.
    #[must_use]
    pub fn prompt_string(id: impl Into<String>, password: bool) -> Self {
        Self {
            id: id.into(),
            kind: InputKind::PromptString {
                description: None,
                default: None,
                password,
            },
        }
    }

    /// Returns `true` when the input masks what the user types.
    #[must_use]
    pub const fn is_password(&self) -> bool {
        matches!(self.kind, InputKind::PromptString { password: true, .. })
    }
}

/// Ways an input value is collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputKind {
    /// Free-text box.
    #[serde(rename_all = "camelCase")]
    PromptString {
        /// Prompt shown to the user.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Pre-filled text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        /// Whether the typed text is masked and stored as a secret.
        #[serde(default)]
        password: bool,
    },
    /// Single choice from a fixed list.
    #[serde(rename_all = "camelCase")]
    PickString {
        /// Prompt shown to the user.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Selectable options.
        options: Vec<PickOption>,
        /// Pre-selected option value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Value produced by running a command.
    #[serde(rename_all = "camelCase")]
    Command {
        /// Command identifier.
        command: String,
        /// Arguments passed to the command.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Value>,
    },
}

/// Option of a [`InputKind::PickString`] input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PickOption {
    /// Option whose label is its value.
    Plain(String),
    /// Option with a separate display label.
    Labeled {
        /// Display text.
        label: String,
        /// Value substituted when chosen.
        value: String,
    },
}

impl PickOption {
    /// Value substituted when this option is chosen.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(value) | Self::Labeled { value, .. } => value,
        }
    }

    /// Text shown for this option.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Plain(label) | Self::Labeled { label, .. } => label,
        }
    }
}
