//! Shared world state for trust flow BDD scenarios.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use switchboard::input_storage::adapters::{InMemorySecretStore, InMemoryStateStore};
use switchboard::server_registry::adapters::{
    DialogTrustPrompter, InMemoryTrustNonceBearer, LoopbackDelegate, RecordingNotificationService,
};
use switchboard::server_registry::domain::{
    McpCollectionDefinition, McpServerDefinition, McpServerTrust, RegistryOptions,
    RegistryResult, ServerDefinitions, ServerLaunch,
};
use switchboard::server_registry::ports::{
    DialogService, PromptRequest, QuickPickRequest, QuickPickService,
};
use switchboard::server_registry::services::{
    McpRegistry, McpServerConnection, Registration, RegistryPorts,
};
use switchboard::variables::{
    CommandRunner, ConfigurationResolverService, InputPrompter, PickStringRequest,
    PromptStringRequest, StaticExecutionContext, VariableResolver, VariableResult,
};

/// Registry type used by the BDD world.
pub type TestRegistry = McpRegistry<DefaultClock>;

/// Dialog whose answer is chosen by a scenario step.
#[derive(Default)]
pub struct ScriptedDialog {
    answer: Mutex<Option<String>>,
    shown: AtomicUsize,
}

impl ScriptedDialog {
    /// Presses the button labelled `label` on the next dialogs.
    pub fn press(&self, label: String) {
        *self.answer.lock().expect("dialog lock") = Some(label);
    }

    /// Number of dialogs shown.
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DialogService for ScriptedDialog {
    async fn prompt(&self, request: PromptRequest) -> Option<usize> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.lock().expect("dialog lock").clone()?;
        request.buttons.iter().position(|button| *button == answer)
    }
}

struct NoQuickPick;

#[async_trait]
impl QuickPickService for NoQuickPick {
    async fn pick_many(&self, _request: QuickPickRequest) -> Option<Vec<String>> {
        None
    }
}

struct NoInputs;

#[async_trait]
impl InputPrompter for NoInputs {
    async fn prompt_string(&self, _request: &PromptStringRequest) -> Option<String> {
        None
    }

    async fn pick_string(&self, _request: &PickStringRequest) -> Option<String> {
        None
    }
}

#[async_trait]
impl CommandRunner for NoInputs {
    async fn execute(&self, _command: &str, _args: &Value) -> VariableResult<Option<String>> {
        Ok(None)
    }
}

/// Scenario world for trust flow behaviour tests.
pub struct TrustWorld {
    /// The registry under test.
    pub registry: TestRegistry,
    /// Dialog the trust prompter shows.
    pub dialog: Arc<ScriptedDialog>,
    /// One trust bearer per server name.
    pub bearers: HashMap<String, Arc<InMemoryTrustNonceBearer>>,
    /// Result of the last resolution.
    pub last_result: Option<RegistryResult<Option<McpServerConnection>>>,
    _registrations: Vec<Registration>,
}

impl TrustWorld {
    /// Creates a world with one loopback delegate and no collections.
    #[must_use]
    pub fn new() -> Self {
        let dialog = Arc::new(ScriptedDialog::default());
        let resolver = ConfigurationResolverService::new(
            VariableResolver::new(Arc::new(StaticExecutionContext::new())),
            Arc::new(NoInputs),
            Arc::new(NoInputs),
        );
        let ports = RegistryPorts {
            resolver: Arc::new(resolver),
            trust_prompter: Arc::new(DialogTrustPrompter::new(
                dialog.clone(),
                Arc::new(NoQuickPick),
            )),
            notifications: Arc::new(RecordingNotificationService::new()),
            state_store: Arc::new(InMemoryStateStore::new()),
            secret_store: Arc::new(InMemorySecretStore::new()),
            dev_mode: None,
        };
        let registry = McpRegistry::new(ports, RegistryOptions::default(), Arc::new(DefaultClock));
        let delegate = registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
        Self {
            registry,
            dialog,
            bearers: HashMap::new(),
            last_result: None,
            _registrations: vec![delegate],
        }
    }

    /// Registers a collection holding one server called `name`.
    pub fn register_server(&mut self, trust: McpServerTrust, name: &str) {
        let definition = McpServerDefinition::new(name, name, server_launch(name));
        let registration = self.registry.register_collection(
            McpCollectionDefinition::new("workspace", "Workspace", trust)
                .with_definitions(ServerDefinitions::new([definition])),
        );
        self._registrations.push(registration);
    }

    /// Returns the bearer remembering trust for `name`.
    pub fn bearer(&mut self, name: &str) -> Arc<InMemoryTrustNonceBearer> {
        Arc::clone(
            self.bearers
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(InMemoryTrustNonceBearer::new())),
        )
    }

    /// Connection produced by the last resolution, if any.
    pub fn connection(&self) -> Result<&McpServerConnection, eyre::Report> {
        match self.last_result.as_ref() {
            Some(Ok(Some(connection))) => Ok(connection),
            Some(Ok(None)) => Err(eyre::eyre!("resolution returned no connection")),
            Some(Err(err)) => Err(eyre::eyre!("resolution failed: {err}")),
            None => Err(eyre::eyre!("no server was resolved in this scenario")),
        }
    }
}

impl Default for TrustWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Launch configuration of the server called `name`.
pub fn server_launch(name: &str) -> ServerLaunch {
    ServerLaunch::stdio(format!("{name}-mcp"))
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TrustWorld {
    TrustWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
