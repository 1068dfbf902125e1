//! Host platform detection shared by expression overlays and variable lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family the resolver runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Macos,
    /// Linux and other Unix-like systems.
    Linux,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Configuration key holding this platform's overrides.
    #[must_use]
    pub const fn overlay_key(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "osx",
            Self::Linux => "linux",
        }
    }

    /// Every overlay key, regardless of host.
    #[must_use]
    pub const fn all_overlay_keys() -> [&'static str; 3] {
        ["windows", "osx", "linux"]
    }

    /// Path separator used when joining file-system paths.
    #[must_use]
    pub const fn path_separator(self) -> &'static str {
        match self {
            Self::Windows => "\\",
            Self::Macos | Self::Linux => "/",
        }
    }

    /// Returns `true` when environment variable names compare case-insensitively.
    #[must_use]
    pub const fn folds_env_case(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
