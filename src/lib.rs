//! Switchboard: MCP server registry and connection broker.
//!
//! This crate tracks collections of Model Context Protocol server definitions
//! contributed by different sources, decides whether the user trusts each
//! server, resolves `${...}` placeholders in launch configurations, and hands
//! out connections that start servers through pluggable host delegates.
//!
//! # Architecture
//!
//! Switchboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure data and rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for UI, storage, and transports
//! - **Adapters**: Concrete implementations of ports (in-memory, file, dialog)
//!
//! # Modules
//!
//! - [`expression`]: Placeholder discovery and substitution in JSON values
//! - [`variables`]: Built-in and interactive variable resolution
//! - [`input_storage`]: Persistence of values the user supplied
//! - [`server_registry`]: Collections, trust, launch preparation, connections
//! - [`platform`]: Host operating system detection

pub mod expression;
pub mod input_storage;
pub mod platform;
pub mod server_registry;
pub mod variables;
