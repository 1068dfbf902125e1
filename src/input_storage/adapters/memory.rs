//! In-memory state and secret stores.

use crate::input_storage::{
    InputStorageError, InputStorageResult, SecretStore, StateStore, StorageScope,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory [`StateStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    state: Arc<RwLock<HashMap<(StorageScope, String), String>>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> InputStorageError {
    InputStorageError::backend(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, scope: StorageScope, key: &str) -> InputStorageResult<Option<String>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.get(&(scope, key.to_owned())).cloned())
    }

    async fn store(
        &self,
        scope: StorageScope,
        key: &str,
        value: String,
    ) -> InputStorageResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.insert((scope, key.to_owned()), value);
        Ok(())
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> InputStorageResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.remove(&(scope, key.to_owned()));
        Ok(())
    }
}

/// Thread-safe in-memory [`SecretStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySecretStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when lock acquisition fails.
    pub fn secret_count(&self) -> InputStorageResult<usize> {
        Ok(self.secrets.read().map_err(|err| lock_error(&err))?.len())
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, key: &str) -> InputStorageResult<Option<String>> {
        let secrets = self.secrets.read().map_err(|err| lock_error(&err))?;
        Ok(secrets.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> InputStorageResult<()> {
        let mut secrets = self.secrets.write().map_err(|err| lock_error(&err))?;
        secrets.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> InputStorageResult<()> {
        let mut secrets = self.secrets.write().map_err(|err| lock_error(&err))?;
        secrets.remove(key);
        Ok(())
    }
}
