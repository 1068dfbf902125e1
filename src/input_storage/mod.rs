//! Persistence for interactively resolved launch inputs.
//!
//! Values the user typed or picked while resolving `${input:...}` and
//! `${command:...}` placeholders are remembered per [`StorageScope`] so that
//! later connection attempts do not prompt again until the inputs are
//! cleared. The module follows hexagonal architecture:
//!
//! - Scope types in [`StorageScope`] and [`ConfigurationTarget`]
//! - Port contracts [`StateStore`] and [`SecretStore`]
//! - Adapter implementations in [`adapters`]
//! - The scoped store [`McpRegistryInputStorage`]

pub mod adapters;

mod domain;
mod ports;
mod service;

pub use domain::{ConfigurationTarget, StorageScope};
pub use ports::{InputStorageError, InputStorageResult, SecretStore, StateStore};
pub use service::{McpRegistryInputStorage, StoredInputs};
