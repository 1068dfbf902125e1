//! In-memory integration tests for launch placeholders and remembered inputs.

use std::sync::Arc;

use super::helpers::{
    RegistryFixture, ScriptedPrompter, project_folder, registry_with, resolve_options,
};
use rstest::{fixture, rstest};
use switchboard::input_storage::{ConfigurationTarget, StorageScope};
use switchboard::server_registry::adapters::{
    InMemoryTrustNonceBearer, LoopbackDelegate, StaticTrustPrompter,
};
use switchboard::server_registry::domain::{
    InteractionReason, McpCollectionDefinition, McpServerDefinition, McpServerTrust,
    RegistryError, ServerDefinitions, StdioLaunch, VariableReplacement,
};
use switchboard::server_registry::services::McpServerConnection;

fn tool_server() -> McpServerDefinition {
    let launch = StdioLaunch::new("${workspaceFolder}/cmd")
        .with_args(["--region", "${input:region}"])
        .with_env("API_KEY", "${input:apiKey}");
    McpServerDefinition::new("tools", "Tool server", launch.into()).with_variable_replacement(
        VariableReplacement::new(ConfigurationTarget::Workspace)
            .with_section("mcp")
            .with_folder(project_folder()),
    )
}

fn answering() -> ScriptedPrompter {
    ScriptedPrompter::default()
        .with_answer("apiKey", "k-123")
        .with_answer("region", "eu")
}

struct Running {
    fixture: RegistryFixture,
    _delegate: switchboard::server_registry::services::Registration,
    _collection: switchboard::server_registry::services::Registration,
}

#[fixture]
fn running() -> Running {
    let fixture = registry_with(answering(), Arc::new(StaticTrustPrompter::TrustNone));
    let delegate = fixture
        .registry
        .register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let collection = fixture.registry.register_collection(
        McpCollectionDefinition::new("workspace", "Workspace", McpServerTrust::Trusted)
            .with_definitions(ServerDefinitions::new([tool_server()])),
    );
    Running {
        fixture,
        _delegate: delegate,
        _collection: collection,
    }
}

async fn resolve(fixture: &RegistryFixture) -> McpServerConnection {
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());
    fixture
        .registry
        .resolve_connection(resolve_options("workspace", "tools", &bearer))
        .await
        .expect("resolution should succeed")
        .expect("launch should resolve")
}

fn assert_substituted(connection: &McpServerConnection) {
    let stdio = connection.launch().as_stdio().expect("stdio launch");
    assert_eq!(stdio.command(), "/work/app/cmd");
    assert_eq!(stdio.args(), ["--region", "eu"]);
    assert_eq!(stdio.env().get("API_KEY").map(String::as_str), Some("k-123"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inputs_are_prompted_once_then_reused(running: Running) {
    let fixture = &running.fixture;

    assert_substituted(&resolve(fixture).await);
    assert_substituted(&resolve(fixture).await);

    let mut asked = fixture.prompter.asked();
    asked.sort();
    assert_eq!(asked, ["apiKey", "region"]);
    let saved = fixture
        .registry
        .saved_inputs(StorageScope::Workspace)
        .await
        .expect("saved inputs");
    assert_eq!(saved.len(), 2);
    assert!(
        saved
            .get("${input:apiKey}")
            .is_some_and(|resolution| resolution.is_secret())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_saved_inputs_prompts_again(running: Running) {
    let fixture = &running.fixture;
    resolve(fixture).await;

    fixture
        .registry
        .clear_saved_inputs(StorageScope::Workspace, None)
        .await
        .expect("clear inputs");
    assert_substituted(&resolve(fixture).await);

    assert_eq!(fixture.prompter.asked().len(), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn headless_resolution_needs_every_placeholder_remembered(running: Running) {
    let fixture = &running.fixture;
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());
    let headless =
        || resolve_options("workspace", "tools", &bearer).with_error_on_user_interaction(true);

    let before = fixture.registry.resolve_connection(headless()).await;
    assert!(matches!(
        before,
        Err(RegistryError::InteractionRequired(InteractionReason::Variables))
    ));
    assert!(fixture.prompter.asked().is_empty());

    resolve(fixture).await;
    let after = fixture.registry.resolve_connection(headless()).await;

    assert!(matches!(
        after,
        Err(RegistryError::InteractionRequired(InteractionReason::Variables))
    ));
    assert_eq!(fixture.prompter.asked().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dismissed_input_cancels_the_launch() {
    let fixture = registry_with(
        ScriptedPrompter::default().with_answer("region", "us"),
        Arc::new(StaticTrustPrompter::TrustNone),
    );
    let _delegate = fixture
        .registry
        .register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture.registry.register_collection(
        McpCollectionDefinition::new("workspace", "Workspace", McpServerTrust::Trusted)
            .with_definitions(ServerDefinitions::new([tool_server()])),
    );
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());

    let connection = fixture
        .registry
        .resolve_connection(resolve_options("workspace", "tools", &bearer))
        .await
        .expect("cancellation is not an error");

    assert!(connection.is_none());
    assert!(fixture.notifications.notifications().is_empty());
    assert!(
        fixture
            .registry
            .saved_inputs(StorageScope::Workspace)
            .await
            .expect("saved inputs")
            .is_empty()
    );
}
