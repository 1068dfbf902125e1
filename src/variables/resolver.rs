//! Non-interactive evaluation of built-in variables.

use super::{ExecutionContext, VariableError, VariableKind, VariableResult, WorkspaceFolder};
use crate::expression::{ConfigurationExpression, Replacement};
use crate::platform::Platform;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied resolution for variable names the resolver does not know.
pub type FallbackResolver = Arc<dyn Fn(&Replacement) -> Option<String> + Send + Sync>;

/// Evaluates `${...}` placeholders against an [`ExecutionContext`].
///
/// Unknown names go to the fallback resolver and otherwise stay as their
/// literal `${...}` text.
pub struct VariableResolver<C>
where
    C: ExecutionContext,
{
    context: Arc<C>,
    environment: HashMap<String, String>,
    platform: Platform,
    cwd: Option<String>,
    fallback: Option<FallbackResolver>,
}

impl<C> VariableResolver<C>
where
    C: ExecutionContext,
{
    /// Creates a resolver over the process environment and working directory.
    #[must_use]
    pub fn new(context: Arc<C>) -> Self {
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
            .map(Utf8PathBuf::into_string);
        Self {
            context,
            environment: std::env::vars().collect(),
            platform: Platform::current(),
            cwd,
            fallback: None,
        }
    }

    /// Replaces the environment used by `${env:NAME}`.
    #[must_use]
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Overrides the platform used for overlays, case folding and separators.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Overrides the directory reported by `${cwd}` outside a workspace.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Installs a resolver for unrecognised variable names.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackResolver) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Execution context consulted for workspace and editor state.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Platform this resolver evaluates for.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolves every outstanding placeholder of `expression` in place.
    ///
    /// `mappings` supplies values for `command:` and `input:` placeholders,
    /// keyed by `prefix:id`.
    ///
    /// # Errors
    ///
    /// Returns the first [`VariableError`] raised by a recognised variable.
    pub fn resolve_expression(
        &self,
        folder: Option<&WorkspaceFolder>,
        expression: &mut ConfigurationExpression,
        mappings: Option<&HashMap<String, String>>,
    ) -> VariableResult<()> {
        self.resolve_in(folder, expression, &self.environment, mappings)
    }

    /// Parses and resolves an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns the first [`VariableError`] raised by a recognised variable.
    pub fn resolve_value(
        &self,
        folder: Option<&WorkspaceFolder>,
        value: Value,
    ) -> VariableResult<Value> {
        let mut expression = ConfigurationExpression::parse_for_platform(value, self.platform);
        self.resolve_expression(folder, &mut expression, None)?;
        Ok(expression.into_value())
    }

    /// Resolves `text` with `environment` standing in for the process environment.
    ///
    /// # Errors
    ///
    /// Returns the first [`VariableError`] raised by a recognised variable.
    pub fn resolve_with_environment(
        &self,
        environment: &HashMap<String, String>,
        folder: Option<&WorkspaceFolder>,
        text: &str,
    ) -> VariableResult<String> {
        let mut expression =
            ConfigurationExpression::parse_for_platform(Value::String(text.to_owned()), self.platform);
        self.resolve_in(folder, &mut expression, environment, None)?;
        match expression.into_value() {
            Value::String(resolved) => Ok(resolved),
            other => Ok(other.to_string()),
        }
    }

    fn resolve_in(
        &self,
        folder: Option<&WorkspaceFolder>,
        expression: &mut ConfigurationExpression,
        environment: &HashMap<String, String>,
        mappings: Option<&HashMap<String, String>>,
    ) -> VariableResult<()> {
        for replacement in expression.unresolved() {
            let value = self.evaluate(&replacement, folder, environment, mappings)?;
            expression.resolve(&replacement, value);
        }
        Ok(())
    }

    /// Evaluates a single placeholder.
    ///
    /// # Errors
    ///
    /// Returns a [`VariableError`] describing why a recognised variable could
    /// not be resolved.
    pub fn evaluate(
        &self,
        replacement: &Replacement,
        folder: Option<&WorkspaceFolder>,
        environment: &HashMap<String, String>,
        mappings: Option<&HashMap<String, String>>,
    ) -> VariableResult<String> {
        let Some(kind) = VariableKind::from_name(replacement.name()) else {
            return Ok(self.fallback_value(replacement));
        };
        let arg = replacement.arg();
        match kind {
            VariableKind::Env => self.env_value(arg, environment),
            VariableKind::Config => self.config_value(arg, folder),
            VariableKind::Command | VariableKind::Input => {
                mapped_value(kind, replacement, mappings)
            }
            VariableKind::ExtensionInstallFolder => self.extension_folder(arg),
            VariableKind::WorkspaceFolder => self.folder_path(kind, arg, folder),
            VariableKind::WorkspaceFolderBasename => self
                .folder_path(kind, arg, folder)
                .map(|path| basename(&path)),
            VariableKind::Cwd => {
                if folder.is_some() || arg.is_some() {
                    self.folder_path(kind, arg, folder)
                } else {
                    Ok(self.cwd.clone().unwrap_or_else(|| replacement.id().to_owned()))
                }
            }
            VariableKind::UserHome => Ok(self
                .context
                .user_home()
                .unwrap_or_else(|| replacement.id().to_owned())),
            VariableKind::LineNumber => self
                .context
                .line_number()
                .map(|line| line.to_string())
                .ok_or(VariableError::NoLineSelected { kind }),
            VariableKind::ColumnNumber => self
                .context
                .column_number()
                .map(|column| column.to_string())
                .ok_or(VariableError::NoLineSelected { kind }),
            VariableKind::SelectedText => self
                .context
                .selected_text()
                .ok_or(VariableError::NoTextSelected),
            VariableKind::ExecPath => Ok(self
                .context
                .exec_path()
                .unwrap_or_else(|| replacement.id().to_owned())),
            VariableKind::ExecInstallFolder => Ok(self
                .context
                .app_root()
                .unwrap_or_else(|| replacement.id().to_owned())),
            VariableKind::PathSeparator => Ok(self.platform.path_separator().to_owned()),
            VariableKind::File
            | VariableKind::FileWorkspaceFolder
            | VariableKind::FileWorkspaceFolderBasename
            | VariableKind::RelativeFile
            | VariableKind::RelativeFileDirname
            | VariableKind::FileDirname
            | VariableKind::FileExtname
            | VariableKind::FileBasename
            | VariableKind::FileBasenameNoExtension
            | VariableKind::FileDirnameBasename => self.file_variable(kind, arg, folder),
        }
    }

    fn fallback_value(&self, replacement: &Replacement) -> String {
        self.fallback
            .as_ref()
            .and_then(|fallback| fallback(replacement))
            .unwrap_or_else(|| replacement.id().to_owned())
    }

    fn env_value(
        &self,
        name: Option<&str>,
        environment: &HashMap<String, String>,
    ) -> VariableResult<String> {
        let key = name
            .filter(|candidate| !candidate.is_empty())
            .ok_or(VariableError::MissingArgument {
                kind: VariableKind::Env,
            })?;
        let found = if self.platform.folds_env_case() {
            environment
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.clone())
        } else {
            environment.get(key).cloned()
        };
        Ok(found.unwrap_or_default())
    }

    fn config_value(
        &self,
        key: Option<&str>,
        folder: Option<&WorkspaceFolder>,
    ) -> VariableResult<String> {
        let setting = key.ok_or(VariableError::MissingArgument {
            kind: VariableKind::Config,
        })?;
        match self.context.configuration_value(folder, setting) {
            None | Some(Value::Null) => Err(VariableError::ConfigNotFound {
                key: setting.to_owned(),
            }),
            Some(Value::Object(_) | Value::Array(_)) => Err(VariableError::ConfigNotScalar {
                key: setting.to_owned(),
            }),
            Some(Value::String(text)) => Ok(text),
            Some(scalar) => Ok(scalar.to_string()),
        }
    }

    fn extension_folder(&self, id: Option<&str>) -> VariableResult<String> {
        let extension_id = id.ok_or(VariableError::MissingArgument {
            kind: VariableKind::ExtensionInstallFolder,
        })?;
        self.context
            .extension_install_folder(extension_id)
            .ok_or_else(|| VariableError::ExtensionNotInstalled {
                id: extension_id.to_owned(),
            })
    }

    fn folder_path(
        &self,
        kind: VariableKind,
        name: Option<&str>,
        folder: Option<&WorkspaceFolder>,
    ) -> VariableResult<String> {
        if let Some(folder_name) = name {
            return self
                .context
                .folder_path(folder_name)
                .ok_or_else(|| VariableError::NoSuchFolder {
                    kind,
                    folder: folder_name.to_owned(),
                });
        }
        if let Some(current) = folder {
            return Ok(current.path.clone());
        }
        if self.context.workspace_folder_count() > 1 {
            Err(VariableError::AmbiguousWorkspaceFolder { kind })
        } else {
            Err(VariableError::NoWorkspaceFolder { kind })
        }
    }

    fn file_variable(
        &self,
        kind: VariableKind,
        arg: Option<&str>,
        folder: Option<&WorkspaceFolder>,
    ) -> VariableResult<String> {
        let file = self
            .context
            .file_path()
            .ok_or(VariableError::NoActiveEditor { kind })?;
        let path = Utf8Path::new(&file);
        let dirname = path.parent().map_or_else(String::new, |parent| parent.as_str().to_owned());
        let scoped = folder.is_some() || arg.is_some();

        let value = match kind {
            VariableKind::FileWorkspaceFolder => self.folder_for_file(kind)?,
            VariableKind::FileWorkspaceFolderBasename => basename(&self.folder_for_file(kind)?),
            VariableKind::RelativeFile if scoped => {
                relative_to(&self.folder_path(kind, arg, folder)?, &file)
            }
            VariableKind::RelativeFileDirname if scoped => {
                let relative = relative_to(&self.folder_path(kind, arg, folder)?, &dirname);
                if relative.is_empty() { ".".to_owned() } else { relative }
            }
            VariableKind::RelativeFileDirname | VariableKind::FileDirname => dirname,
            VariableKind::FileExtname => path
                .extension()
                .map_or_else(String::new, |extension| format!(".{extension}")),
            VariableKind::FileBasename => basename(&file),
            VariableKind::FileBasenameNoExtension => path
                .file_stem()
                .map_or_else(String::new, str::to_owned),
            VariableKind::FileDirnameBasename => basename(&dirname),
            _ => file,
        };
        Ok(value)
    }

    fn folder_for_file(&self, kind: VariableKind) -> VariableResult<String> {
        self.context
            .workspace_folder_path_for_file()
            .ok_or(VariableError::NoFileWorkspaceFolder { kind })
    }
}

impl<C> fmt::Debug for VariableResolver<C>
where
    C: ExecutionContext,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableResolver")
            .field("platform", &self.platform)
            .field("cwd", &self.cwd)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

fn mapped_value(
    kind: VariableKind,
    replacement: &Replacement,
    mappings: Option<&HashMap<String, String>>,
) -> VariableResult<String> {
    if replacement.arg().is_none() {
        return Err(VariableError::MissingArgument { kind });
    }
    mappings
        .and_then(|values| values.get(replacement.inner()))
        .cloned()
        .ok_or_else(|| VariableError::MissingMappedValue {
            kind,
            key: replacement.inner().to_owned(),
        })
}

fn basename(path: &str) -> String {
    Utf8Path::new(path)
        .file_name()
        .map_or_else(String::new, str::to_owned)
}

fn relative_to(base: &str, path: &str) -> String {
    Utf8Path::new(path)
        .strip_prefix(base)
        .map_or_else(|_| path.to_owned(), |relative| relative.as_str().to_owned())
}
