//! Scoped persistence of resolved launch inputs.

use super::{InputStorageError, InputStorageResult, SecretStore, StateStore, StorageScope};
use crate::expression::Resolution;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

const PLAIN_KEY: &str = "mcpInputs";

/// Resolved inputs keyed by their raw placeholder id, e.g. `${input:apiKey}`.
pub type StoredInputs = BTreeMap<String, Resolution>;

/// Remembers interactively resolved values for one [`StorageScope`].
///
/// Plain values live in a [`StateStore`] document; values from password
/// inputs live in a [`SecretStore`]. Writes merge per key and the last writer
/// wins.
#[derive(Clone)]
pub struct McpRegistryInputStorage {
    scope: StorageScope,
    state: Arc<dyn StateStore>,
    secrets: Arc<dyn SecretStore>,
}

impl McpRegistryInputStorage {
    /// Creates storage for `scope`.
    #[must_use]
    pub fn new(
        scope: StorageScope,
        state: Arc<dyn StateStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            scope,
            state,
            secrets,
        }
    }

    /// Scope this storage writes to.
    #[must_use]
    pub const fn scope(&self) -> StorageScope {
        self.scope
    }

    fn secret_key(&self) -> String {
        format!("{PLAIN_KEY}.secrets.{}", self.scope)
    }

    /// Reads every stored input; secrets take precedence over plain values.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError`] when either store fails or holds a
    /// corrupt record.
    pub async fn get_map(&self) -> InputStorageResult<StoredInputs> {
        let mut values = self.read_plain().await?;
        values.extend(self.read_secrets().await?);
        Ok(values)
    }

    /// Stores plain values, replacing existing entries with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError`] when the state store fails.
    pub async fn set_plain_text(&self, values: StoredInputs) -> InputStorageResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut stored = self.read_plain().await?;
        trace!(scope = %self.scope, count = values.len(), "persisting plain inputs");
        stored.extend(values);
        self.write_plain(&stored).await
    }

    /// Stores secret values, replacing existing entries with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError`] when the secret store fails.
    pub async fn set_secrets(&self, values: StoredInputs) -> InputStorageResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut stored = self.read_secrets().await?;
        trace!(scope = %self.scope, count = values.len(), "persisting secret inputs");
        stored.extend(values);
        self.write_secrets(&stored).await
    }

    /// Forgets the input stored under `key` in both stores.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError`] when either store fails.
    pub async fn clear(&self, key: &str) -> InputStorageResult<()> {
        let mut plain = self.read_plain().await?;
        if plain.remove(key).is_some() {
            self.write_plain(&plain).await?;
        }
        let mut secrets = self.read_secrets().await?;
        if secrets.remove(key).is_some() {
            self.write_secrets(&secrets).await?;
        }
        Ok(())
    }

    /// Forgets every input in this scope.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError`] when either store fails.
    pub async fn clear_all(&self) -> InputStorageResult<()> {
        self.state.remove(self.scope, PLAIN_KEY).await?;
        self.secrets.delete(&self.secret_key()).await
    }

    async fn read_plain(&self) -> InputStorageResult<StoredInputs> {
        let raw = self.state.get(self.scope, PLAIN_KEY).await?;
        decode(PLAIN_KEY, raw.as_deref())
    }

    async fn read_secrets(&self) -> InputStorageResult<StoredInputs> {
        let key = self.secret_key();
        let raw = self.secrets.get(&key).await?;
        decode(&key, raw.as_deref())
    }

    async fn write_plain(&self, values: &StoredInputs) -> InputStorageResult<()> {
        let encoded = serde_json::to_string(values).map_err(InputStorageError::backend)?;
        self.state.store(self.scope, PLAIN_KEY, encoded).await
    }

    async fn write_secrets(&self, values: &StoredInputs) -> InputStorageResult<()> {
        let encoded = serde_json::to_string(values).map_err(InputStorageError::backend)?;
        self.secrets.set(&self.secret_key(), encoded).await
    }
}

impl fmt::Debug for McpRegistryInputStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpRegistryInputStorage")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

fn decode(key: &str, raw: Option<&str>) -> InputStorageResult<StoredInputs> {
    raw.map_or_else(
        || Ok(StoredInputs::new()),
        |contents| {
            serde_json::from_str(contents).map_err(|err| InputStorageError::Corrupt {
                key: key.to_owned(),
                reason: err.to_string(),
            })
        },
    )
}
