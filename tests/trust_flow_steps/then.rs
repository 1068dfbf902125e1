//! Then steps for trust flow BDD scenarios.

use super::world::{TrustWorld, server_launch};
use rstest_bdd_macros::then;
use switchboard::server_registry::domain::{
    CacheNonce, ConnectionState, InteractionReason, RegistryError, TrustNonceBearer, TrustedNonce,
};

#[then("a connection is returned")]
fn connection_is_returned(world: &TrustWorld) -> Result<(), eyre::Report> {
    world.connection().map(|_| ())
}

#[then("no connection is returned")]
fn no_connection_is_returned(world: &TrustWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(None)) => Ok(()),
        Some(Ok(Some(_))) => Err(eyre::eyre!("expected resolution to be denied")),
        Some(Err(err)) => Err(eyre::eyre!("resolution failed: {err}")),
        None => Err(eyre::eyre!("no server was resolved in this scenario")),
    }
}

#[then("the user was asked {count:usize} times")]
fn user_was_asked(world: &TrustWorld, count: usize) -> Result<(), eyre::Report> {
    let shown = world.dialog.shown();
    if shown != count {
        return Err(eyre::eyre!("expected {count} trust dialogs, saw {shown}"));
    }
    Ok(())
}

#[then(r#"server "{name}" is trusted at its current nonce"#)]
fn trusted_at_current_nonce(world: &mut TrustWorld, name: String) -> Result<(), eyre::Report> {
    let expected = TrustedNonce::approved(&CacheNonce::fingerprint(&server_launch(&name)));
    let remembered = world.bearer(&name).trusted_at_nonce();
    if remembered != expected {
        return Err(eyre::eyre!("expected {expected:?}, bearer holds {remembered:?}"));
    }
    Ok(())
}

#[then(r#"server "{name}" is remembered as not trusted"#)]
fn remembered_as_not_trusted(world: &mut TrustWorld, name: String) -> Result<(), eyre::Report> {
    let remembered = world.bearer(&name).trusted_at_nonce();
    if remembered != TrustedNonce::NotTrusted {
        return Err(eyre::eyre!("expected a refusal, bearer holds {remembered:?}"));
    }
    Ok(())
}

#[then(r#"server "{name}" has no remembered decision"#)]
fn no_remembered_decision(world: &mut TrustWorld, name: String) -> Result<(), eyre::Report> {
    let remembered = world.bearer(&name).trusted_at_nonce();
    if remembered != TrustedNonce::Unknown {
        return Err(eyre::eyre!("expected no decision, bearer holds {remembered:?}"));
    }
    Ok(())
}

#[then("resolution fails because trust needs the user")]
fn resolution_needs_the_user(world: &TrustWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(RegistryError::InteractionRequired(InteractionReason::ServerTrust))) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("unexpected error: {err}")),
        Some(Ok(_)) => Err(eyre::eyre!("expected headless resolution to fail")),
        None => Err(eyre::eyre!("no server was resolved in this scenario")),
    }
}

#[then("the connection is running")]
fn connection_is_running(world: &TrustWorld) -> Result<(), eyre::Report> {
    let state = world.connection()?.state();
    if state != ConnectionState::Running {
        return Err(eyre::eyre!("expected a running connection, found {state:?}"));
    }
    Ok(())
}
