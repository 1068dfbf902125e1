//! Application services for the registry and its connections.

mod connection;
mod inputs;
mod launch;
mod registry;
mod trust;

pub use connection::{McpServerConnection, McpServerHandler, PROTOCOL_VERSION};
pub use launch::ResolveConnectionOptions;
pub use registry::{McpRegistry, RegistryPorts, Registration};
