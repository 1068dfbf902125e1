//! Typed variable resolution failures.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Built-in variable families understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// `${env:NAME}`
    Env,
    /// `${config:KEY}`
    Config,
    /// `${command:ID}`
    Command,
    /// `${input:ID}`
    Input,
    /// `${extensionInstallFolder:ID}`
    ExtensionInstallFolder,
    /// `${workspaceFolder}` and `${workspaceFolder:name}`
    WorkspaceFolder,
    /// `${workspaceFolderBasename}`
    WorkspaceFolderBasename,
    /// `${cwd}`
    Cwd,
    /// `${userHome}`
    UserHome,
    /// `${lineNumber}`
    LineNumber,
    /// `${columnNumber}`
    ColumnNumber,
    /// `${selectedText}`
    SelectedText,
    /// `${file}`
    File,
    /// `${fileWorkspaceFolder}`
    FileWorkspaceFolder,
    /// `${fileWorkspaceFolderBasename}`
    FileWorkspaceFolderBasename,
    /// `${relativeFile}`
    RelativeFile,
    /// `${relativeFileDirname}`
    RelativeFileDirname,
    /// `${fileDirname}`
    FileDirname,
    /// `${fileExtname}`
    FileExtname,
    /// `${fileBasename}`
    FileBasename,
    /// `${fileBasenameNoExtension}`
    FileBasenameNoExtension,
    /// `${fileDirnameBasename}`
    FileDirnameBasename,
    /// `${execPath}`
    ExecPath,
    /// `${execInstallFolder}`
    ExecInstallFolder,
    /// `${pathSeparator}` and `${/}`
    PathSeparator,
}

impl VariableKind {
    /// Maps a placeholder name to its variable family.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "env" => Self::Env,
            "config" => Self::Config,
            "command" => Self::Command,
            "input" => Self::Input,
            "extensionInstallFolder" => Self::ExtensionInstallFolder,
            "workspaceFolder" => Self::WorkspaceFolder,
            "workspaceFolderBasename" => Self::WorkspaceFolderBasename,
            "cwd" => Self::Cwd,
            "userHome" => Self::UserHome,
            "lineNumber" => Self::LineNumber,
            "columnNumber" => Self::ColumnNumber,
            "selectedText" => Self::SelectedText,
            "file" => Self::File,
            "fileWorkspaceFolder" => Self::FileWorkspaceFolder,
            "fileWorkspaceFolderBasename" => Self::FileWorkspaceFolderBasename,
            "relativeFile" => Self::RelativeFile,
            "relativeFileDirname" => Self::RelativeFileDirname,
            "fileDirname" => Self::FileDirname,
            "fileExtname" => Self::FileExtname,
            "fileBasename" => Self::FileBasename,
            "fileBasenameNoExtension" => Self::FileBasenameNoExtension,
            "fileDirnameBasename" => Self::FileDirnameBasename,
            "execPath" => Self::ExecPath,
            "execInstallFolder" => Self::ExecInstallFolder,
            "pathSeparator" | "/" => Self::PathSeparator,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical placeholder name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Config => "config",
            Self::Command => "command",
            Self::Input => "input",
            Self::ExtensionInstallFolder => "extensionInstallFolder",
            Self::WorkspaceFolder => "workspaceFolder",
            Self::WorkspaceFolderBasename => "workspaceFolderBasename",
            Self::Cwd => "cwd",
            Self::UserHome => "userHome",
            Self::LineNumber => "lineNumber",
            Self::ColumnNumber => "columnNumber",
            Self::SelectedText => "selectedText",
            Self::File => "file",
            Self::FileWorkspaceFolder => "fileWorkspaceFolder",
            Self::FileWorkspaceFolderBasename => "fileWorkspaceFolderBasename",
            Self::RelativeFile => "relativeFile",
            Self::RelativeFileDirname => "relativeFileDirname",
            Self::FileDirname => "fileDirname",
            Self::FileExtname => "fileExtname",
            Self::FileBasename => "fileBasename",
            Self::FileBasenameNoExtension => "fileBasenameNoExtension",
            Self::FileDirnameBasename => "fileDirnameBasename",
            Self::ExecPath => "execPath",
            Self::ExecInstallFolder => "execInstallFolder",
            Self::PathSeparator => "pathSeparator",
        }
    }

    /// Returns `true` for variables that may need the user to act.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Command | Self::Input)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type for variable resolution.
pub type VariableResult<T> = Result<T, VariableError>;

/// Errors raised while evaluating a placeholder.
#[derive(Debug, Clone, Error)]
pub enum VariableError {
    /// The variable needs an argument after `:` and none was given.
    #[error("variable {kind} can not be resolved because no argument was given")]
    MissingArgument {
        /// Variable family.
        kind: VariableKind,
    },

    /// `${config:KEY}` names a setting that does not exist.
    #[error("variable config can not be resolved because setting '{key}' is not found")]
    ConfigNotFound {
        /// Setting key.
        key: String,
    },

    /// `${config:KEY}` names an object or array setting.
    #[error("variable config can not be resolved because '{key}' is a structured value")]
    ConfigNotScalar {
        /// Setting key.
        key: String,
    },

    /// No caller-supplied value exists for a `command:` or `input:` id.
    #[error("variable {kind} can not be resolved because no value was supplied for '{key}'")]
    MissingMappedValue {
        /// Variable family.
        kind: VariableKind,
        /// Lookup key in `prefix:id` form.
        key: String,
    },

    /// `${extensionInstallFolder:ID}` names an extension that is not installed.
    #[error("variable extensionInstallFolder can not be resolved because extension '{id}' is not installed")]
    ExtensionNotInstalled {
        /// Extension identifier.
        id: String,
    },

    /// `${workspaceFolder:name}` names an unknown folder.
    #[error("variable {kind} can not be resolved because no folder named '{folder}' exists")]
    NoSuchFolder {
        /// Variable family.
        kind: VariableKind,
        /// Requested folder name.
        folder: String,
    },

    /// Several folders are open and none was named.
    #[error(
        "variable {kind} can not be resolved in a multi folder workspace; scope it with ':' and a folder name"
    )]
    AmbiguousWorkspaceFolder {
        /// Variable family.
        kind: VariableKind,
    },

    /// No folder is open.
    #[error("variable {kind} can not be resolved because no folder is open")]
    NoWorkspaceFolder {
        /// Variable family.
        kind: VariableKind,
    },

    /// No editor is active.
    #[error("variable {kind} can not be resolved because no editor is open")]
    NoActiveEditor {
        /// Variable family.
        kind: VariableKind,
    },

    /// The active file does not belong to any workspace folder.
    #[error("variable {kind} can not be resolved because the active file is outside every workspace folder")]
    NoFileWorkspaceFolder {
        /// Variable family.
        kind: VariableKind,
    },

    /// No line or column is selected in the active editor.
    #[error("variable {kind} can not be resolved because no line is selected")]
    NoLineSelected {
        /// Variable family.
        kind: VariableKind,
    },

    /// No text is selected in the active editor.
    #[error("variable selectedText can not be resolved because no text is selected")]
    NoTextSelected,

    /// `${input:ID}` refers to an input that is not declared.
    #[error("input variable '{id}' is not defined")]
    UndefinedInput {
        /// Input identifier.
        id: String,
    },

    /// The declared inputs could not be read.
    #[error("inputs declared in '{section}' are invalid: {reason}")]
    InvalidInputs {
        /// Configuration section holding the inputs.
        section: String,
        /// Parse failure.
        reason: String,
    },

    /// A command backing `${command:ID}` or a command input failed.
    #[error("command '{command}' failed: {source}")]
    CommandFailed {
        /// Command identifier.
        command: String,
        /// Underlying failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl VariableError {
    /// Wraps a command execution failure.
    pub fn command_failed(
        command: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source: Arc::new(err),
        }
    }

    /// Variable family the failure belongs to.
    #[must_use]
    pub const fn kind(&self) -> VariableKind {
        match self {
            Self::MissingArgument { kind }
            | Self::MissingMappedValue { kind, .. }
            | Self::NoSuchFolder { kind, .. }
            | Self::AmbiguousWorkspaceFolder { kind }
            | Self::NoWorkspaceFolder { kind }
            | Self::NoActiveEditor { kind }
            | Self::NoFileWorkspaceFolder { kind }
            | Self::NoLineSelected { kind } => *kind,
            Self::ConfigNotFound { .. } | Self::ConfigNotScalar { .. } => VariableKind::Config,
            Self::ExtensionNotInstalled { .. } => VariableKind::ExtensionInstallFolder,
            Self::NoTextSelected => VariableKind::SelectedText,
            Self::UndefinedInput { .. } | Self::InvalidInputs { .. } => VariableKind::Input,
            Self::CommandFailed { .. } => VariableKind::Command,
        }
    }
}
