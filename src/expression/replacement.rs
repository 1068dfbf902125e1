//! Parsed placeholders and the values they resolve to.

use crate::variables::ConfiguredInput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed `${...}` placeholder.
///
/// Identical literal ids share a single [`Replacement`] inside one
/// expression, however many times they occur.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Replacement {
    id: String,
    name: String,
    arg: Option<String>,
    inner: String,
}

impl Replacement {
    /// Builds a replacement from the text between `${` and `}`.
    #[must_use]
    pub fn from_inner(inner: &str) -> Self {
        let (name, arg) = inner.split_once(':').map_or_else(
            || (inner.to_owned(), None),
            |(name, arg)| (name.to_owned(), Some(arg.to_owned())),
        );
        Self {
            id: format!("${{{inner}}}"),
            name,
            arg,
            inner: inner.to_owned(),
        }
    }

    /// Parses a full literal such as `${input:apiKey}`.
    ///
    /// Returns `None` when the text is not exactly one placeholder.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        id.strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|inner| !inner.is_empty())
            .map(Self::from_inner)
    }

    /// The full literal text, including `${` and `}`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Variable name before the first `:`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument after the first `:`, if any.
    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    /// Text between the braces.
    #[must_use]
    pub fn inner(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Value recorded for a resolved placeholder.
///
/// A resolution without a value is remembered but performs no substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Text substituted for the placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Input definition the value was collected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ConfiguredInput>,
}

impl Resolution {
    /// Creates a resolution carrying `value`.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            input: None,
        }
    }

    /// Attaches the input definition that produced the value.
    #[must_use]
    pub fn with_input(mut self, input: ConfiguredInput) -> Self {
        self.input = Some(input);
        self
    }

    /// Returns `true` when the value came from a password prompt.
    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.input.as_ref().is_some_and(ConfiguredInput::is_password)
    }
}

impl From<&str> for Resolution {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Resolution {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Option<String>> for Resolution {
    fn from(value: Option<String>) -> Self {
        Self { value, input: None }
    }
}
