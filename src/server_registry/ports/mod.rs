//! Port contracts for the server registry.

mod host;
mod trust;
mod ui;

pub use host::{McpHostDelegate, McpMessageTransport, TransportLog};
pub use trust::{DevModeDebugging, TrustPrompter};
pub use ui::{
    DialogPrompt, DialogService, Notification, NotificationAction, NotificationService,
    PromptButton, PromptRequest, QuickPickItem, QuickPickRequest, QuickPickService, Severity,
};

#[cfg(test)]
pub(crate) use host::MockMcpHostDelegate;
#[cfg(test)]
pub(crate) use ui::{MockDialogService, MockNotificationService, MockQuickPickService};
