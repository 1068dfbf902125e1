//! Launch configuration value objects and their content fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// How a server process or endpoint is reached.
///
/// Launches are plain data: string fields may still contain `${...}`
/// placeholders until the registry has substituted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerLaunch {
    /// Local process speaking over standard input and output.
    Stdio(StdioLaunch),
    /// Remote endpoint reached over HTTP.
    Http(HttpLaunch),
}

impl ServerLaunch {
    /// Creates a STDIO launch for `command`.
    #[must_use]
    pub fn stdio(command: impl Into<String>) -> Self {
        Self::Stdio(StdioLaunch::new(command))
    }

    /// Creates an HTTP launch for `uri`.
    #[must_use]
    pub fn http(uri: impl Into<String>) -> Self {
        Self::Http(HttpLaunch::new(uri))
    }

    /// Returns the transport kind as stored in the `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Stdio(_) => "stdio",
            Self::Http(_) => "http",
        }
    }

    /// Returns the STDIO settings when this is a STDIO launch.
    #[must_use]
    pub const fn as_stdio(&self) -> Option<&StdioLaunch> {
        match self {
            Self::Stdio(launch) => Some(launch),
            Self::Http(_) => None,
        }
    }

    /// Returns the HTTP settings when this is an HTTP launch.
    #[must_use]
    pub const fn as_http(&self) -> Option<&HttpLaunch> {
        match self {
            Self::Http(launch) => Some(launch),
            Self::Stdio(_) => None,
        }
    }
}

/// Settings for a server started as a local process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioLaunch {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cwd: Option<String>,
}

impl StdioLaunch {
    /// Creates settings that run `command` without arguments.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            env_file: None,
            cwd: None,
        }
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = values.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one environment variable.
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Sets a file of `NAME=value` lines loaded into the environment.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<String>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_cwd(mut self, path: impl Into<String>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment variables.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the optional environment file.
    #[must_use]
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Returns the optional working directory.
    #[must_use]
    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }
}

impl From<StdioLaunch> for ServerLaunch {
    fn from(launch: StdioLaunch) -> Self {
        Self::Stdio(launch)
    }
}

/// Settings for a server reached over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLaunch {
    uri: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl HttpLaunch {
    /// Creates settings for `uri` without extra headers.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Adds one request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns the endpoint URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

impl From<HttpLaunch> for ServerLaunch {
    fn from(launch: HttpLaunch) -> Self {
        Self::Http(launch)
    }
}

/// Version token identifying the content a user approved.
///
/// When a definition's nonce differs from the one remembered by its trust
/// bearer, the server is considered changed and trust is asked again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheNonce(String);

impl CacheNonce {
    /// Wraps an opaque nonce supplied by the contributor.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives a nonce from the launch content as a hex SHA-256 digest.
    #[must_use]
    pub fn fingerprint(launch: &ServerLaunch) -> Self {
        let canonical = serde_json::to_vec(launch).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        Self(
            digest
                .iter()
                .flat_map(|byte| [byte >> 4, byte & 0x0f])
                .filter_map(|nibble| char::from_digit(u32::from(nibble), 16))
                .collect(),
        )
    }

    /// Returns the nonce text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheNonce {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
