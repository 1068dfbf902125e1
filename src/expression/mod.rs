//! Placeholder expressions over JSON configuration.
//!
//! [`ConfigurationExpression`] parses an arbitrary JSON value (or bare
//! string), merges the host platform's `windows` / `osx` / `linux` overlay,
//! and tracks every `${...}` placeholder found in string values and object
//! keys. Callers resolve placeholders one at a time; substituted values are
//! scanned again so nested placeholders surface through the same
//! [`Unresolved`] cursor, with a visited path preventing cycles.

mod configuration;
mod location;
mod replacement;
mod scan;
mod unresolved;

pub use configuration::ConfigurationExpression;
pub use replacement::{Replacement, Resolution};
pub use unresolved::Unresolved;
