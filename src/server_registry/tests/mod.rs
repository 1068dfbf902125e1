//! Unit tests for the server registry.


use std::sync::Arc;

use crate::input_storage::adapters::{InMemorySecretStore, InMemoryStateStore};
use crate::server_registry::adapters::{
    InMemoryTrustNonceBearer, LoopbackDelegate, RecordingNotificationService,
};
use crate::server_registry::domain::{
    McpCollectionDefinition, McpServerDefinition, McpServerTrust, RegistryOptions,
    ServerDefinitions, ServerLaunch, TrustNonceBearer,
};
use crate::server_registry::ports::{DevModeDebugging, NotificationService, TrustPrompter};
use crate::server_registry::services::{McpRegistry, RegistryPorts, ResolveConnectionOptions};
use crate::variables::{
    ConfigurationResolverService, MockCommandRunner, MockInputPrompter, StaticExecutionContext,
    VariableResolver, WorkspaceFolder,
};
use mockable::DefaultClock;
use serde_json::json;

pub(super) type TestRegistry = McpRegistry<DefaultClock>;

pub(super) fn project_folder() -> WorkspaceFolder {
    WorkspaceFolder::new("app", "/work/app")
}

fn context() -> StaticExecutionContext {
    StaticExecutionContext::new()
        .with_folder(project_folder())
        .with_setting(
            "mcp.inputs",
            json!([
                {"id": "token", "type": "promptString", "password": true},
                {"id": "name", "type": "promptString"}
            ]),
        )
}

/// Registry wired to in-memory stores and a recording notification sink.
pub(super) struct Harness {
    pub(super) registry: TestRegistry,
    pub(super) notifications: Arc<RecordingNotificationService>,
    pub(super) secrets: Arc<InMemorySecretStore>,
}

pub(super) struct HarnessBuilder {
    prompter: MockInputPrompter,
    trust: Arc<dyn TrustPrompter>,
    notifications: Option<Arc<dyn NotificationService>>,
    dev_mode: Option<Arc<dyn DevModeDebugging>>,
}

impl HarnessBuilder {
    pub(super) fn new(trust: Arc<dyn TrustPrompter>) -> Self {
        Self {
            prompter: MockInputPrompter::new(),
            trust,
            notifications: None,
            dev_mode: None,
        }
    }

    pub(super) fn with_prompter(mut self, prompter: MockInputPrompter) -> Self {
        self.prompter = prompter;
        self
    }

    pub(super) fn with_notifications(mut self, notifications: Arc<dyn NotificationService>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub(super) fn with_dev_mode(mut self, dev_mode: Arc<dyn DevModeDebugging>) -> Self {
        self.dev_mode = Some(dev_mode);
        self
    }

    pub(super) fn build(self) -> Harness {
        let recording = Arc::new(RecordingNotificationService::new());
        let fallback: Arc<dyn NotificationService> = recording.clone();
        let secrets = Arc::new(InMemorySecretStore::new());
        let resolver = ConfigurationResolverService::new(
            VariableResolver::new(Arc::new(context())),
            Arc::new(self.prompter),
            Arc::new(MockCommandRunner::new()),
        );
        let ports = RegistryPorts {
            resolver: Arc::new(resolver),
            trust_prompter: self.trust,
            notifications: self.notifications.unwrap_or(fallback),
            state_store: Arc::new(InMemoryStateStore::new()),
            secret_store: secrets.clone(),
            dev_mode: self.dev_mode,
        };
        Harness {
            registry: McpRegistry::new(ports, RegistryOptions::default(), Arc::new(DefaultClock)),
            notifications: recording,
            secrets,
        }
    }
}

pub(super) fn stdio_definition(id: &str, command: &str) -> McpServerDefinition {
    McpServerDefinition::new(id, format!("{id} server"), ServerLaunch::stdio(command))
}

pub(super) fn collection(
    id: &str,
    trust: McpServerTrust,
    definitions: impl IntoIterator<Item = McpServerDefinition>,
) -> McpCollectionDefinition {
    McpCollectionDefinition::new(id, format!("{id} collection"), trust)
        .with_definitions(ServerDefinitions::new(definitions))
}

pub(super) fn loopback() -> Arc<LoopbackDelegate> {
    Arc::new(LoopbackDelegate::new(0))
}

pub(super) fn options(
    collection_id: &str,
    definition_id: &str,
    bearer: &Arc<InMemoryTrustNonceBearer>,
) -> ResolveConnectionOptions {
    let bearer: Arc<dyn TrustNonceBearer> = bearer.clone();
    ResolveConnectionOptions::new(collection_id, definition_id, bearer)
}
