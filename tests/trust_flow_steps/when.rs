//! When steps for trust flow BDD scenarios.

use std::sync::Arc;

use super::world::{TrustWorld, run_async};
use rstest_bdd_macros::when;
use switchboard::server_registry::domain::TrustNonceBearer;
use switchboard::server_registry::services::ResolveConnectionOptions;

fn resolve(world: &mut TrustWorld, name: &str, headless: bool) {
    let bearer: Arc<dyn TrustNonceBearer> = world.bearer(name);
    let options = ResolveConnectionOptions::new("workspace", name, bearer)
        .with_error_on_user_interaction(headless);
    world.last_result = Some(run_async(world.registry.resolve_connection(options)));
}

#[when(r#"server "{name}" is resolved"#)]
fn server_is_resolved(world: &mut TrustWorld, name: String) {
    resolve(world, &name, false);
}

#[when(r#"server "{name}" is resolved without user interaction"#)]
fn server_is_resolved_headless(world: &mut TrustWorld, name: String) {
    resolve(world, &name, true);
}

#[when("the connection is started")]
fn connection_is_started(world: &mut TrustWorld) -> Result<(), eyre::Report> {
    let connection = world.connection()?;
    run_async(connection.start());
    Ok(())
}
