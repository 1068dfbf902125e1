//! Shared doubles and wiring for in-memory registry integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::DefaultClock;
use serde_json::{Value, json};
use switchboard::input_storage::adapters::{InMemorySecretStore, InMemoryStateStore};
use switchboard::input_storage::{SecretStore, StateStore};
use switchboard::server_registry::adapters::{
    DialogTrustPrompter, InMemoryTrustNonceBearer, RecordingNotificationService,
};
use switchboard::server_registry::domain::{RegistryOptions, TrustNonceBearer};
use switchboard::server_registry::ports::{
    DialogService, PromptRequest, QuickPickRequest, QuickPickService, TrustPrompter,
};
use switchboard::server_registry::services::{
    McpRegistry, RegistryPorts, ResolveConnectionOptions,
};
use switchboard::variables::{
    CommandRunner, ConfigurationResolverService, InputPrompter, PickStringRequest,
    PromptStringRequest, StaticExecutionContext, VariableResolver, VariableResult,
    WorkspaceFolder,
};

/// Registry type used by integration tests.
pub type TestRegistry = McpRegistry<DefaultClock>;

/// The single workspace folder every test context opens.
pub fn project_folder() -> WorkspaceFolder {
    WorkspaceFolder::new("app", "/work/app")
}

/// Input prompter answering from a fixed table and recording each prompt.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Answers `id` with `value`; unknown ids are treated as dismissed.
    pub fn with_answer(mut self, id: &str, value: &str) -> Self {
        self.answers.insert(id.to_owned(), value.to_owned());
        self
    }

    /// Input ids prompted so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("prompter lock").clone()
    }

    fn answer(&self, id: &str) -> Option<String> {
        self.asked.lock().expect("prompter lock").push(id.to_owned());
        self.answers.get(id).cloned()
    }
}

#[async_trait]
impl InputPrompter for ScriptedPrompter {
    async fn prompt_string(&self, request: &PromptStringRequest) -> Option<String> {
        self.answer(&request.id)
    }

    async fn pick_string(&self, request: &PickStringRequest) -> Option<String> {
        self.answer(&request.id)
    }
}

/// Command runner for contexts that declare no command inputs.
pub struct NoCommands;

#[async_trait]
impl CommandRunner for NoCommands {
    async fn execute(&self, _command: &str, _args: &Value) -> VariableResult<Option<String>> {
        Ok(None)
    }
}

/// Dialog that always picks the same button and counts how often it opened.
pub struct CountingDialog {
    answer: Option<usize>,
    shown: AtomicUsize,
    requests: Mutex<Vec<PromptRequest>>,
}

impl CountingDialog {
    /// Creates a dialog answering with button `answer`.
    pub fn new(answer: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            shown: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of dialogs shown.
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    /// Every request shown, in order.
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().expect("dialog lock").clone()
    }
}

#[async_trait]
impl DialogService for CountingDialog {
    async fn prompt(&self, request: PromptRequest) -> Option<usize> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("dialog lock").push(request);
        self.answer
    }
}

/// Quick-pick that selects a fixed set of ids and counts how often it opened.
pub struct CountingQuickPick {
    picked: Vec<String>,
    shown: AtomicUsize,
}

impl CountingQuickPick {
    /// Creates a quick-pick that selects `picked`.
    pub fn new(picked: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            picked: picked.iter().map(|id| (*id).to_owned()).collect(),
            shown: AtomicUsize::new(0),
        })
    }

    /// Number of quick-picks shown.
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuickPickService for CountingQuickPick {
    async fn pick_many(&self, _request: QuickPickRequest) -> Option<Vec<String>> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        Some(self.picked.clone())
    }
}

/// Registry plus the collaborators tests inspect.
pub struct RegistryFixture {
    /// Registry under test.
    pub registry: TestRegistry,
    /// Input prompter behind the registry's resolver.
    pub prompter: Arc<ScriptedPrompter>,
    /// Notifications shown by the registry.
    pub notifications: Arc<RecordingNotificationService>,
}

/// Builds a registry around `prompter` and `trust_prompter` with fresh stores.
pub fn registry_with(
    prompter: ScriptedPrompter,
    trust_prompter: Arc<dyn TrustPrompter>,
) -> RegistryFixture {
    registry_with_stores(
        prompter,
        trust_prompter,
        Arc::new(InMemoryStateStore::new()),
        Arc::new(InMemorySecretStore::new()),
    )
}

/// Builds a registry around caller-supplied stores.
pub fn registry_with_stores(
    prompter: ScriptedPrompter,
    trust_prompter: Arc<dyn TrustPrompter>,
    state_store: Arc<dyn StateStore>,
    secret_store: Arc<dyn SecretStore>,
) -> RegistryFixture {
    let context = StaticExecutionContext::new()
        .with_folder(project_folder())
        .with_setting(
            "mcp.inputs",
            json!([
                {"id": "apiKey", "type": "promptString", "password": true},
                {"id": "region", "type": "pickString", "options": ["eu", "us"]}
            ]),
        );
    let prompter = Arc::new(prompter);
    let notifications = Arc::new(RecordingNotificationService::new());
    let resolver = ConfigurationResolverService::new(
        VariableResolver::new(Arc::new(context)),
        Arc::clone(&prompter),
        Arc::new(NoCommands),
    );
    let ports = RegistryPorts {
        resolver: Arc::new(resolver),
        trust_prompter,
        notifications: notifications.clone(),
        state_store,
        secret_store,
        dev_mode: None,
    };
    RegistryFixture {
        registry: McpRegistry::new(ports, RegistryOptions::default(), Arc::new(DefaultClock)),
        prompter,
        notifications,
    }
}

/// Trust prompter backed by the given dialog and quick-pick.
pub fn dialog_prompter(
    dialog: &Arc<CountingDialog>,
    quick_pick: &Arc<CountingQuickPick>,
) -> Arc<dyn TrustPrompter> {
    Arc::new(DialogTrustPrompter::new(dialog.clone(), quick_pick.clone()))
}

/// Options for resolving `definition_id` with a dedicated bearer.
pub fn resolve_options(
    collection_id: &str,
    definition_id: &str,
    bearer: &Arc<InMemoryTrustNonceBearer>,
) -> ResolveConnectionOptions {
    let bearer: Arc<dyn TrustNonceBearer> = bearer.clone();
    ResolveConnectionOptions::new(collection_id, definition_id, bearer)
}
