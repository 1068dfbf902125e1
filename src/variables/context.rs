//! Execution context port consulted by the variable resolver.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A workspace folder that placeholders resolve against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    /// Display name used by `${workspaceFolder:name}`.
    pub name: String,
    /// Absolute folder path.
    pub path: String,
}

impl WorkspaceFolder {
    /// Creates a workspace folder.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Editor and workspace state visible to the variable resolver.
pub trait ExecutionContext: Send + Sync {
    /// Path of the file in the active editor.
    fn file_path(&self) -> Option<String>;

    /// Workspace folder containing the active file.
    fn workspace_folder_path_for_file(&self) -> Option<String>;

    /// Path of the open folder named `folder_name`.
    fn folder_path(&self, folder_name: &str) -> Option<String>;

    /// Number of open workspace folders.
    fn workspace_folder_count(&self) -> usize;

    /// Reads a setting, scoped to `folder` when given.
    fn configuration_value(&self, folder: Option<&WorkspaceFolder>, key: &str) -> Option<Value>;

    /// Install location of an extension.
    fn extension_install_folder(&self, extension_id: &str) -> Option<String>;

    /// One-based cursor line in the active editor.
    fn line_number(&self) -> Option<u32>;

    /// One-based cursor column in the active editor.
    fn column_number(&self) -> Option<u32>;

    /// Selected text in the active editor.
    fn selected_text(&self) -> Option<String>;

    /// Path of the running executable.
    fn exec_path(&self) -> Option<String>;

    /// Application install root.
    fn app_root(&self) -> Option<String>;

    /// Home directory of the current user.
    fn user_home(&self) -> Option<String> {
        None
    }
}

/// Fixed [`ExecutionContext`] for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticExecutionContext {
    folders: Vec<WorkspaceFolder>,
    file_path: Option<String>,
    file_folder: Option<String>,
    settings: HashMap<String, Value>,
    extensions: HashMap<String, String>,
    cursor: Option<(u32, u32)>,
    selection: Option<String>,
    exec_path: Option<String>,
    app_root: Option<String>,
    user_home: Option<String>,
}

impl StaticExecutionContext {
    /// Creates an empty context: no folders, no editor, no settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an open workspace folder.
    #[must_use]
    pub fn with_folder(mut self, folder: WorkspaceFolder) -> Self {
        self.folders.push(folder);
        self
    }

    /// Sets the active file and the folder that contains it.
    #[must_use]
    pub fn with_active_file(
        mut self,
        file_path: impl Into<String>,
        folder_path: Option<String>,
    ) -> Self {
        self.file_path = Some(file_path.into());
        self.file_folder = folder_path;
        self
    }

    /// Sets a setting value.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Marks an extension as installed at `path`.
    #[must_use]
    pub fn with_extension(mut self, id: impl Into<String>, path: impl Into<String>) -> Self {
        self.extensions.insert(id.into(), path.into());
        self
    }

    /// Sets the cursor position.
    #[must_use]
    pub const fn with_cursor(mut self, line: u32, column: u32) -> Self {
        self.cursor = Some((line, column));
        self
    }

    /// Sets the selected text.
    #[must_use]
    pub fn with_selection(mut self, text: impl Into<String>) -> Self {
        self.selection = Some(text.into());
        self
    }

    /// Sets the executable path and install root.
    #[must_use]
    pub fn with_exec_path(mut self, exec_path: impl Into<String>, app_root: impl Into<String>) -> Self {
        self.exec_path = Some(exec_path.into());
        self.app_root = Some(app_root.into());
        self
    }

    /// Sets the user's home directory.
    #[must_use]
    pub fn with_user_home(mut self, path: impl Into<String>) -> Self {
        self.user_home = Some(path.into());
        self
    }
}

impl ExecutionContext for StaticExecutionContext {
    fn file_path(&self) -> Option<String> {
        self.file_path.clone()
    }

    fn workspace_folder_path_for_file(&self) -> Option<String> {
        self.file_folder.clone()
    }

    fn folder_path(&self, folder_name: &str) -> Option<String> {
        self.folders
            .iter()
            .find(|folder| folder.name == folder_name)
            .map(|folder| folder.path.clone())
    }

    fn workspace_folder_count(&self) -> usize {
        self.folders.len()
    }

    fn configuration_value(&self, _folder: Option<&WorkspaceFolder>, key: &str) -> Option<Value> {
        self.settings.get(key).cloned()
    }

    fn extension_install_folder(&self, extension_id: &str) -> Option<String> {
        self.extensions.get(extension_id).cloned()
    }

    fn line_number(&self) -> Option<u32> {
        self.cursor.map(|(line, _)| line)
    }

    fn column_number(&self) -> Option<u32> {
        self.cursor.map(|(_, column)| column)
    }

    fn selected_text(&self) -> Option<String> {
        self.selection.clone()
    }

    fn exec_path(&self) -> Option<String> {
        self.exec_path.clone()
    }

    fn app_root(&self) -> Option<String> {
        self.app_root.clone()
    }

    fn user_home(&self) -> Option<String> {
        self.user_home.clone()
    }
}
