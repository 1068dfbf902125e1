//! Connection lifecycle states.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a server connection or its transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ConnectionState {
    /// Not running. Initial state, and the state after `stop`.
    #[default]
    Stopped,
    /// A transport is being started.
    Starting,
    /// The transport is up.
    Running,
    /// The transport failed.
    Error {
        /// Failure reported by the transport.
        message: String,
    },
}

impl ConnectionState {
    /// Creates an error state.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns the canonical state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Error { .. } => "error",
        }
    }

    /// Returns `true` for every state except [`Self::Starting`].
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Starting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { message } => write!(f, "error: {message}"),
            Self::Stopped | Self::Starting | Self::Running => f.write_str(self.as_str()),
        }
    }
}

/// A connection state and when it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Current state.
    pub state: ConnectionState,
    /// When the state was entered.
    pub changed_at: DateTime<Utc>,
}

impl ConnectionStatus {
    /// Stamps `state` with the clock's current time.
    #[must_use]
    pub fn new(state: ConnectionState, clock: &(impl Clock + ?Sized)) -> Self {
        Self {
            state,
            changed_at: clock.utc(),
        }
    }
}
