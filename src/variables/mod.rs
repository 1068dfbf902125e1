//! Built-in variable resolution for launch configuration.
//!
//! [`VariableResolver`] evaluates the fixed vocabulary of `${...}` names
//! (environment, settings, workspace and active-file paths, editor state)
//! against an [`ExecutionContext`]. [`ConfigurationResolverService`] adds the
//! interactive path for `${input:...}` and `${command:...}`, prompting through
//! the [`InputPrompter`] and [`CommandRunner`] ports and recording what the
//! user supplied on the same [`crate::expression::ConfigurationExpression`].

mod context;
mod error;
mod input;
mod resolver;
mod service;

pub use context::{ExecutionContext, StaticExecutionContext, WorkspaceFolder};
pub use error::{VariableError, VariableKind, VariableResult};
pub use input::{ConfiguredInput, InputKind, PickOption};
pub use resolver::{FallbackResolver, VariableResolver};
pub use service::{
    CommandRunner, ConfigurationResolver, ConfigurationResolverService, InputPrompter,
    PickStringRequest, PromptStringRequest,
};

#[cfg(test)]
pub(crate) use service::{MockCommandRunner, MockInputPrompter};

#[cfg(test)]
mod tests;
