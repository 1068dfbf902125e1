//! Given steps for trust flow BDD scenarios.

use super::world::TrustWorld;
use rstest_bdd_macros::given;
use switchboard::server_registry::domain::McpServerTrust;

#[given(r#"a trusted collection with server "{name}""#)]
fn trusted_collection(world: &mut TrustWorld, name: String) {
    world.register_server(McpServerTrust::Trusted, &name);
}

#[given(r#"a nonce-trusted collection with server "{name}""#)]
fn nonce_trusted_collection(world: &mut TrustWorld, name: String) {
    world.register_server(McpServerTrust::TrustedOnNonce, &name);
}

#[given(r#"the user will press "{label}""#)]
fn user_will_press(world: &mut TrustWorld, label: String) {
    world.dialog.press(label);
}
