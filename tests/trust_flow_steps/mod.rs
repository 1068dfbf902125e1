//! Step definitions for trust flow scenarios.

mod given;
mod then;
mod when;
pub mod world;
