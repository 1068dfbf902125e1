//! Interactive resolution of `${input:...}` and `${command:...}` placeholders.

use super::{
    ConfiguredInput, ExecutionContext, InputKind, PickOption, VariableError, VariableKind,
    VariableResolver, VariableResult, WorkspaceFolder,
};
use crate::expression::{ConfigurationExpression, Replacement, Resolution};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Request for a free-text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptStringRequest {
    /// Input identifier.
    pub id: String,
    /// Prompt shown to the user.
    pub description: Option<String>,
    /// Pre-filled text.
    pub default: Option<String>,
    /// Whether typed text is masked.
    pub password: bool,
}

/// Request for a single choice from a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickStringRequest {
    /// Input identifier.
    pub id: String,
    /// Prompt shown to the user.
    pub description: Option<String>,
    /// Options in display order.
    pub options: Vec<PickOption>,
    /// Pre-selected option value.
    pub default: Option<String>,
}

/// UI collaborator that asks the user for input values.
///
/// `None` means the user dismissed the prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InputPrompter: Send + Sync {
    /// Shows a text box.
    async fn prompt_string(&self, request: &PromptStringRequest) -> Option<String>;

    /// Shows a single-choice list and returns the chosen option's value.
    async fn pick_string(&self, request: &PickStringRequest) -> Option<String>;
}

/// Runs host commands that produce variable values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Executes `command` with `args` (`Value::Null` when none).
    ///
    /// `Ok(None)` means the command was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::CommandFailed`] when the command fails.
    async fn execute(&self, command: &str, args: &Value) -> VariableResult<Option<String>>;
}

/// Resolver view consumed by the server registry.
#[async_trait]
pub trait ConfigurationResolver: Send + Sync {
    /// Resolves every outstanding placeholder without user interaction.
    ///
    /// # Errors
    ///
    /// Returns a [`VariableError`] for the first variable that cannot be
    /// resolved.
    async fn resolve_async(
        &self,
        folder: Option<&WorkspaceFolder>,
        expression: ConfigurationExpression,
    ) -> VariableResult<Value>;

    /// Prompts for `input:` and `command:` placeholders of `expression`.
    ///
    /// Results are recorded on the same expression so that they appear in
    /// [`ConfigurationExpression::resolved`]. `defaults` pre-fills prompts,
    /// keyed by `prefix:id`. Returns the collected values, or `None` when the
    /// user cancelled.
    ///
    /// # Errors
    ///
    /// Returns a [`VariableError`] when inputs are undeclared or malformed,
    /// or when a command fails.
    async fn resolve_with_interaction(
        &self,
        folder: Option<&WorkspaceFolder>,
        expression: &mut ConfigurationExpression,
        section: Option<&str>,
        defaults: Option<&HashMap<String, String>>,
    ) -> VariableResult<Option<HashMap<String, String>>>;
}

/// [`ConfigurationResolver`] backed by a [`VariableResolver`] and UI ports.
pub struct ConfigurationResolverService<C, P, R>
where
    C: ExecutionContext,
    P: InputPrompter,
    R: CommandRunner,
{
    resolver: VariableResolver<C>,
    prompter: Arc<P>,
    commands: Arc<R>,
}

impl<C, P, R> ConfigurationResolverService<C, P, R>
where
    C: ExecutionContext,
    P: InputPrompter,
    R: CommandRunner,
{
    /// Creates a resolver service.
    #[must_use]
    pub const fn new(resolver: VariableResolver<C>, prompter: Arc<P>, commands: Arc<R>) -> Self {
        Self {
            resolver,
            prompter,
            commands,
        }
    }

    /// Underlying non-interactive resolver.
    #[must_use]
    pub const fn resolver(&self) -> &VariableResolver<C> {
        &self.resolver
    }

    fn declared_inputs(
        &self,
        folder: Option<&WorkspaceFolder>,
        section: Option<&str>,
    ) -> VariableResult<Vec<ConfiguredInput>> {
        let Some(name) = section else {
            return Ok(Vec::new());
        };
        let key = format!("{name}.inputs");
        match self.resolver.context().configuration_value(folder, &key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|err| VariableError::InvalidInputs {
                    section: name.to_owned(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn collect_input(
        &self,
        input: &ConfiguredInput,
        default: Option<&String>,
    ) -> VariableResult<Option<String>> {
        match &input.kind {
            InputKind::PromptString {
                description,
                default: declared_default,
                password,
            } => Ok(self
                .prompter
                .prompt_string(&PromptStringRequest {
                    id: input.id.clone(),
                    description: description.clone(),
                    default: default.or(declared_default.as_ref()).cloned(),
                    password: *password,
                })
                .await),
            InputKind::PickString {
                description,
                options,
                default: declared_default,
            } => Ok(self
                .prompter
                .pick_string(&PickStringRequest {
                    id: input.id.clone(),
                    description: description.clone(),
                    options: options.clone(),
                    default: default.or(declared_default.as_ref()).cloned(),
                })
                .await),
            InputKind::Command { command, args } => {
                self.commands
                    .execute(command, args.as_ref().unwrap_or(&Value::Null))
                    .await
            }
        }
    }

    async fn resolve_interactive(
        &self,
        replacement: &Replacement,
        inputs: &[ConfiguredInput],
        defaults: Option<&HashMap<String, String>>,
    ) -> VariableResult<Option<Resolution>> {
        let Some(kind) = VariableKind::from_name(replacement.name()) else {
            return Ok(None);
        };
        let id = replacement
            .arg()
            .ok_or(VariableError::MissingArgument { kind })?;
        match kind {
            VariableKind::Input => {
                let input = inputs
                    .iter()
                    .find(|declared| declared.id == id)
                    .ok_or_else(|| VariableError::UndefinedInput { id: id.to_owned() })?;
                let default = defaults.and_then(|values| values.get(replacement.inner()));
                let value = self.collect_input(input, default).await?;
                Ok(value.map(|collected| Resolution::new(collected).with_input(input.clone())))
            }
            VariableKind::Command => {
                let value = self.commands.execute(id, &Value::Null).await?;
                Ok(value.map(Resolution::new))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl<C, P, R> ConfigurationResolver for ConfigurationResolverService<C, P, R>
where
    C: ExecutionContext,
    P: InputPrompter,
    R: CommandRunner,
{
    async fn resolve_async(
        &self,
        folder: Option<&WorkspaceFolder>,
        mut expression: ConfigurationExpression,
    ) -> VariableResult<Value> {
        self.resolver
            .resolve_expression(folder, &mut expression, None)?;
        Ok(expression.into_value())
    }

    async fn resolve_with_interaction(
        &self,
        folder: Option<&WorkspaceFolder>,
        expression: &mut ConfigurationExpression,
        section: Option<&str>,
        defaults: Option<&HashMap<String, String>>,
    ) -> VariableResult<Option<HashMap<String, String>>> {
        let inputs = self.declared_inputs(folder, section)?;
        let mut collected = HashMap::new();
        for replacement in expression.unresolved() {
            let is_interactive = VariableKind::from_name(replacement.name())
                .is_some_and(VariableKind::is_interactive);
            if !is_interactive {
                continue;
            }
            let Some(resolution) = self
                .resolve_interactive(&replacement, &inputs, defaults)
                .await?
            else {
                debug!(placeholder = %replacement, "interactive input cancelled");
                return Ok(None);
            };
            if let Some(value) = &resolution.value {
                collected.insert(replacement.inner().to_owned(), value.clone());
            }
            expression.resolve(&replacement, resolution);
        }
        Ok(Some(collected))
    }
}
