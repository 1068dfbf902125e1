//! Adapter implementations for input storage ports.

mod file;
mod memory;

pub use file::FileStateStore;
pub use memory::{InMemorySecretStore, InMemoryStateStore};
