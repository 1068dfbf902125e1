//! Persistence ports behind input storage.

use super::StorageScope;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for storage operations.
pub type InputStorageResult<T> = Result<T, InputStorageError>;

/// Scoped string key-value persistence for plain values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads `key` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be read.
    async fn get(&self, scope: StorageScope, key: &str) -> InputStorageResult<Option<String>>;

    /// Writes `value` under `key` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be written.
    async fn store(&self, scope: StorageScope, key: &str, value: String)
    -> InputStorageResult<()>;

    /// Deletes `key` in `scope`. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be written.
    async fn remove(&self, scope: StorageScope, key: &str) -> InputStorageResult<()>;
}

/// Credential store for secret values.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Reads a secret.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be read.
    async fn get(&self, key: &str) -> InputStorageResult<Option<String>>;

    /// Writes a secret.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be written.
    async fn set(&self, key: &str, value: String) -> InputStorageResult<()>;

    /// Deletes a secret. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InputStorageError::Backend`] when the store cannot be written.
    async fn delete(&self, key: &str) -> InputStorageResult<()>;
}

/// Errors returned by input storage and its backing stores.
#[derive(Debug, Clone, Error)]
pub enum InputStorageError {
    /// A stored record could not be decoded.
    #[error("stored inputs under '{key}' are corrupt: {reason}")]
    Corrupt {
        /// Storage key of the record.
        key: String,
        /// Decode failure.
        reason: String,
    },

    /// The backing store failed.
    #[error("input storage backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl InputStorageError {
    /// Wraps a backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
