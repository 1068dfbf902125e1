//! In-memory integration tests for lazily contributed collections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::helpers::{ScriptedPrompter, TestRegistry, registry_with, resolve_options};
use async_trait::async_trait;
use rstest::rstest;
use switchboard::server_registry::adapters::{
    InMemoryTrustNonceBearer, LoopbackDelegate, StaticTrustPrompter,
};
use switchboard::server_registry::domain::{
    LazyCollectionLoader, McpCollectionDefinition, McpServerDefinition, McpServerTrust,
    ServerDefinitions, ServerLaunch,
};
use switchboard::server_registry::services::Registration;

/// Stands in for a contributor that only learns its servers on activation.
struct ActivatingContributor {
    registry: Arc<TestRegistry>,
    servers: Mutex<Option<Vec<McpServerDefinition>>>,
    registrations: Mutex<Vec<Registration>>,
    removals: AtomicUsize,
}

impl ActivatingContributor {
    fn new(registry: Arc<TestRegistry>, servers: Option<Vec<McpServerDefinition>>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            servers: Mutex::new(servers),
            registrations: Mutex::new(Vec::new()),
            removals: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LazyCollectionLoader for ActivatingContributor {
    async fn load(&self) {
        let Some(servers) = self.servers.lock().expect("contributor lock").take() else {
            return;
        };
        let registration = self.registry.register_collection(
            McpCollectionDefinition::new("extension", "Extension", McpServerTrust::Trusted)
                .with_definitions(ServerDefinitions::new(servers)),
        );
        self.registrations
            .lock()
            .expect("contributor lock")
            .push(registration);
    }

    fn removed(&self) {
        self.removals.fetch_add(1, Ordering::SeqCst);
    }
}

fn placeholder(contributor: &Arc<ActivatingContributor>) -> McpCollectionDefinition {
    McpCollectionDefinition::new("extension", "Extension", McpServerTrust::Trusted)
        .lazy(contributor.clone(), false)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolving_a_lazy_server_activates_its_contributor() {
    let registry = Arc::new(
        registry_with(ScriptedPrompter::default(), Arc::new(StaticTrustPrompter::TrustNone))
            .registry,
    );
    let _delegate = registry.register_delegate(Arc::new(LoopbackDelegate::new(0)));
    let contributor = ActivatingContributor::new(
        Arc::clone(&registry),
        Some(vec![McpServerDefinition::new(
            "search",
            "Search",
            ServerLaunch::stdio("search-mcp"),
        )]),
    );
    let _placeholder = registry.register_collection(placeholder(&contributor));
    let observed = registry.subscribe_collections();
    let bearer = Arc::new(InMemoryTrustNonceBearer::new());

    let connection = registry
        .resolve_connection(resolve_options("extension", "search", &bearer))
        .await
        .expect("resolution should succeed")
        .expect("activated server should resolve");

    assert_eq!(connection.launch(), &ServerLaunch::stdio("search-mcp"));
    assert_eq!(observed.borrow().len(), 1);
    assert!(registry.collections().iter().all(|found| !found.is_lazy()));
    assert_eq!(contributor.removals.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn contributor_without_servers_is_told_once() {
    let registry = Arc::new(
        registry_with(ScriptedPrompter::default(), Arc::new(StaticTrustPrompter::TrustNone))
            .registry,
    );
    let contributor = ActivatingContributor::new(Arc::clone(&registry), None);
    let _placeholder = registry.register_collection(placeholder(&contributor));

    registry.discover_collections().await;
    registry.discover_collections().await;

    assert_eq!(registry.collections().len(), 1);
    assert_eq!(contributor.removals.load(Ordering::SeqCst), 1);
}
