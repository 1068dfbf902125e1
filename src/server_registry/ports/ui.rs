//! User-facing prompt, picker, and notification ports.

use crate::server_registry::domain::ConfigLocation;
use async_trait::async_trait;

/// A modal question with a row of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Headline.
    pub message: String,
    /// Longer explanation.
    pub detail: Option<String>,
    /// Button labels, in display order.
    pub buttons: Vec<String>,
}

/// Shows modal prompts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DialogService: Send + Sync {
    /// Returns the index of the pressed button, or `None` when dismissed.
    async fn prompt(&self, request: PromptRequest) -> Option<usize>;
}

/// A button that yields `outcome` when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptButton<T> {
    /// Button label.
    pub label: String,
    /// Value produced by pressing the button.
    pub outcome: T,
}

impl<T> PromptButton<T> {
    /// Creates a button.
    #[must_use]
    pub fn new(label: impl Into<String>, outcome: T) -> Self {
        Self {
            label: label.into(),
            outcome,
        }
    }
}

/// A prompt whose buttons carry typed outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogPrompt<T> {
    message: String,
    detail: Option<String>,
    buttons: Vec<PromptButton<T>>,
}

impl<T> DialogPrompt<T> {
    /// Creates a prompt without buttons.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            buttons: Vec::new(),
        }
    }

    /// Sets the explanation text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Appends a button.
    #[must_use]
    pub fn with_button(mut self, label: impl Into<String>, outcome: T) -> Self {
        self.buttons.push(PromptButton::new(label, outcome));
        self
    }

    /// Shows the prompt and returns the pressed button's outcome.
    ///
    /// Dismissal and out-of-range answers yield `None`.
    pub async fn show(self, dialog: &dyn DialogService) -> Option<T> {
        let request = PromptRequest {
            message: self.message,
            detail: self.detail,
            buttons: self
                .buttons
                .iter()
                .map(|button| button.label.clone())
                .collect(),
        };
        let pressed = dialog.prompt(request).await?;
        self.buttons
            .into_iter()
            .nth(pressed)
            .map(|button| button.outcome)
    }
}

/// A selectable entry in a quick-pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickPickItem {
    /// Value returned when the item is selected.
    pub id: String,
    /// Primary text.
    pub label: String,
    /// Secondary text.
    pub description: Option<String>,
    /// Whether the item starts selected.
    pub picked: bool,
    /// Configuration file the item can jump to.
    pub location: Option<ConfigLocation>,
}

/// A multi-select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickPickRequest {
    /// Hint shown in the filter box.
    pub placeholder: String,
    /// Items, in display order.
    pub items: Vec<QuickPickItem>,
}

/// Shows quick-pick lists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuickPickService: Send + Sync {
    /// Returns the ids of the accepted items, or `None` when hidden.
    async fn pick_many(&self, request: QuickPickRequest) -> Option<Vec<String>>;
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something may need attention.
    Warning,
    /// An operation failed.
    Error,
}

/// A follow-up the user can take from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    /// Opens a configuration file at a location.
    OpenConfiguration {
        /// Button label.
        label: String,
        /// Where to open.
        location: ConfigLocation,
    },
}

/// A non-modal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Offered follow-ups.
    pub actions: Vec<NotificationAction>,
}

/// Shows non-modal notifications.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationService: Send + Sync {
    /// Shows `notification`.
    fn notify(&self, notification: Notification);
}
