//! In-memory integration tests for trust decisions through the dialog prompter.

use std::sync::Arc;

use super::helpers::{
    CountingDialog, CountingQuickPick, ScriptedPrompter, dialog_prompter, registry_with,
    resolve_options,
};
use rstest::rstest;
use switchboard::server_registry::adapters::{InMemoryTrustNonceBearer, LoopbackDelegate};
use switchboard::server_registry::domain::{
    CacheNonce, DefinitionId, McpCollectionDefinition, McpServerDefinition, McpServerTrust,
    McpStartServerInteraction, ServerDefinitions, ServerLaunch, TrustNonceBearer, TrustedNonce,
};

fn workspace(trust: McpServerTrust, ids: &[&str]) -> McpCollectionDefinition {
    let definitions = ids.iter().map(|id| {
        McpServerDefinition::new(*id, format!("{id} tools"), ServerLaunch::stdio(format!("{id}-mcp")))
    });
    McpCollectionDefinition::new("workspace", "Workspace", trust)
        .with_definitions(ServerDefinitions::new(definitions))
        .with_source("Workspace settings")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trusted_collection_launches_without_any_prompt() {
    let dialog = CountingDialog::new(Some(1));
    let quick_pick = CountingQuickPick::new(&[]);
    let fixture = registry_with(ScriptedPrompter::default(), dialog_prompter(&dialog, &quick_pick));
    let _delegate = fixture.registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture
        .registry
        .register_collection(workspace(McpServerTrust::Trusted, &["docs"]));
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());

    let connection = fixture
        .registry
        .resolve_connection(resolve_options("workspace", "docs", &bearer))
        .await
        .expect("resolution should succeed")
        .expect("trusted server should resolve");

    assert_eq!(connection.launch(), &ServerLaunch::stdio("docs-mcp"));
    assert_eq!(dialog.shown(), 0);
    assert!(fixture.prompter.asked().is_empty());
    assert_eq!(bearer.trusted_at_nonce(), TrustedNonce::Unknown);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn changed_definition_is_reapproved_silently_with_auto_trust() {
    let dialog = CountingDialog::new(Some(1));
    let quick_pick = CountingQuickPick::new(&[]);
    let fixture = registry_with(ScriptedPrompter::default(), dialog_prompter(&dialog, &quick_pick));
    let _delegate = fixture.registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture
        .registry
        .register_collection(workspace(McpServerTrust::TrustedOnNonce, &["docs"]));
    let bearer = Arc::new(InMemoryTrustNonceBearer::with_nonce(TrustedNonce::Nonce(
        "previous-launch".to_owned(),
    )));

    let connection = fixture
        .registry
        .resolve_connection(
            resolve_options("workspace", "docs", &bearer).with_auto_trust_changes(true),
        )
        .await
        .expect("resolution should succeed");

    assert!(connection.is_some());
    assert_eq!(dialog.shown(), 0);
    let current = CacheNonce::fingerprint(&ServerLaunch::stdio("docs-mcp"));
    assert_eq!(bearer.trusted_at_nonce(), TrustedNonce::approved(&current));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn declining_a_changed_definition_is_remembered() {
    let dialog = CountingDialog::new(Some(1));
    let quick_pick = CountingQuickPick::new(&[]);
    let fixture = registry_with(ScriptedPrompter::default(), dialog_prompter(&dialog, &quick_pick));
    let _delegate = fixture.registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture
        .registry
        .register_collection(workspace(McpServerTrust::TrustedOnNonce, &["docs"]));
    let bearer = Arc::new(InMemoryTrustNonceBearer::with_nonce(TrustedNonce::Nonce(
        "previous-launch".to_owned(),
    )));

    let first = fixture
        .registry
        .resolve_connection(resolve_options("workspace", "docs", &bearer))
        .await
        .expect("resolution should succeed");
    let second = fixture
        .registry
        .resolve_connection(resolve_options("workspace", "docs", &bearer))
        .await
        .expect("resolution should succeed");

    assert!(first.is_none());
    assert!(second.is_none());
    assert_eq!(dialog.shown(), 1);
    assert_eq!(bearer.trusted_at_nonce(), TrustedNonce::NotTrusted);
    let shown = dialog.requests();
    let request = shown.first().expect("dialog request recorded");
    assert_eq!(request.message, "Trust and run MCP server docs tools?");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_starts_share_one_dialog() {
    let dialog = CountingDialog::new(Some(1));
    let quick_pick = CountingQuickPick::new(&["alpha"]);
    let fixture = registry_with(ScriptedPrompter::default(), dialog_prompter(&dialog, &quick_pick));
    let _delegate = fixture.registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture.registry.register_collection(workspace(
        McpServerTrust::TrustedOnNonce,
        &["alpha", "beta"],
    ));
    let interaction = Arc::new(McpStartServerInteraction::new());
    interaction.add_participant("alpha".into());
    interaction.add_participant("beta".into());
    let alpha = Arc::new(InMemoryTrustNonceBearer::new());
    let beta = Arc::new(InMemoryTrustNonceBearer::new());

    let (first, second) = tokio::join!(
        fixture.registry.resolve_connection(
            resolve_options("workspace", "alpha", &alpha).with_interaction(Arc::clone(&interaction))
        ),
        fixture.registry.resolve_connection(
            resolve_options("workspace", "beta", &beta).with_interaction(Arc::clone(&interaction))
        ),
    );

    assert!(first.expect("alpha resolution").is_some());
    assert!(second.expect("beta resolution").is_none());
    assert_eq!(dialog.shown(), 1);
    assert_eq!(quick_pick.shown(), 1);
    assert!(matches!(alpha.trusted_at_nonce(), TrustedNonce::Nonce(_)));
    assert_eq!(beta.trusted_at_nonce(), TrustedNonce::NotTrusted);
    assert_eq!(
        interaction.choice(),
        Some(Some(vec![DefinitionId::from("alpha")]))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dismissed_dialog_asks_again_next_time() {
    let dialog = CountingDialog::new(None);
    let quick_pick = CountingQuickPick::new(&[]);
    let fixture = registry_with(ScriptedPrompter::default(), dialog_prompter(&dialog, &quick_pick));
    let _delegate = fixture.registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let _collection = fixture
        .registry
        .register_collection(workspace(McpServerTrust::TrustedOnNonce, &["docs"]));
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());

    for _ in 0..2 {
        let connection = fixture
            .registry
            .resolve_connection(resolve_options("workspace", "docs", &bearer))
            .await
            .expect("resolution should succeed");
        assert!(connection.is_none());
    }

    assert_eq!(dialog.shown(), 2);
    assert_eq!(bearer.trusted_at_nonce(), TrustedNonce::Unknown);
}
