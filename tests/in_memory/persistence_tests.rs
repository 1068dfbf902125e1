//! Integration tests for inputs remembered across registry instances.

use std::sync::Arc;

use super::helpers::{ScriptedPrompter, registry_with_stores};
use camino::Utf8PathBuf;
use rstest::rstest;
use switchboard::input_storage::adapters::{FileStateStore, InMemorySecretStore};
use switchboard::input_storage::{ConfigurationTarget, StorageScope};
use switchboard::server_registry::adapters::StaticTrustPrompter;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn saved_inputs_survive_a_new_registry() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(temp.path().join("state")).expect("utf-8 temp path");
    let secrets = Arc::new(InMemorySecretStore::new());

    let first = registry_with_stores(
        ScriptedPrompter::default(),
        Arc::new(StaticTrustPrompter::TrustNone),
        Arc::new(FileStateStore::open(&path).expect("open state dir")),
        secrets.clone(),
    );
    first
        .registry
        .set_saved_input("${input:region}", ConfigurationTarget::Workspace, "eu")
        .await
        .expect("save input");
    first
        .registry
        .set_saved_input("${input:region}", ConfigurationTarget::User, "us")
        .await
        .expect("save input");
    drop(first);

    let second = registry_with_stores(
        ScriptedPrompter::default(),
        Arc::new(StaticTrustPrompter::TrustNone),
        Arc::new(FileStateStore::open(&path).expect("reopen state dir")),
        secrets,
    );
    let workspace = second
        .registry
        .saved_inputs(StorageScope::Workspace)
        .await
        .expect("workspace inputs");
    let profile = second
        .registry
        .saved_inputs(StorageScope::Profile)
        .await
        .expect("profile inputs");

    assert_eq!(
        workspace
            .get("${input:region}")
            .and_then(|resolution| resolution.value.as_deref()),
        Some("eu")
    );
    assert_eq!(
        profile
            .get("${input:region}")
            .and_then(|resolution| resolution.value.as_deref()),
        Some("us")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_persists_to_disk() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    let store = Arc::new(FileStateStore::open(&path).expect("open state dir"));
    let fixture = registry_with_stores(
        ScriptedPrompter::default(),
        Arc::new(StaticTrustPrompter::TrustNone),
        store.clone(),
        Arc::new(InMemorySecretStore::new()),
    );
    fixture
        .registry
        .set_saved_input("${input:region}", ConfigurationTarget::Workspace, "eu")
        .await
        .expect("save input");

    fixture
        .registry
        .clear_saved_inputs(StorageScope::Workspace, None)
        .await
        .expect("clear inputs");

    let reopened = registry_with_stores(
        ScriptedPrompter::default(),
        Arc::new(StaticTrustPrompter::TrustNone),
        Arc::new(FileStateStore::open(&path).expect("reopen state dir")),
        Arc::new(InMemorySecretStore::new()),
    );
    assert!(
        reopened
            .registry
            .saved_inputs(StorageScope::Workspace)
            .await
            .expect("workspace inputs")
            .is_empty()
    );
}
