//! MCP server registry and connection broker.
//!
//! Contributors register collections of server definitions and host
//! delegates able to start them. Consumers ask the registry to resolve a
//! definition into a connection; on the way the registry checks whether the
//! user trusts the server, substitutes `${...}` placeholders in its launch
//! configuration, and remembers the inputs the user supplied. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
