//! Saved launch inputs: listing, editing, and clearing.

use super::McpRegistry;
use crate::expression::{ConfigurationExpression, Replacement};
use crate::input_storage::{
    ConfigurationTarget, InputStorageResult, McpRegistryInputStorage, StorageScope, StoredInputs,
};
use crate::server_registry::domain::RegistryResult;
use crate::variables::WorkspaceFolder;
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

impl<C> McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Returns every input remembered for `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::server_registry::domain::RegistryError::InputStorage`]
    /// when the stores cannot be read.
    pub async fn saved_inputs(&self, scope: StorageScope) -> RegistryResult<StoredInputs> {
        Ok(self.input_storage(scope).get_map().await?)
    }

    /// Forgets one saved input, or all of them when `input_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::server_registry::domain::RegistryError::InputStorage`]
    /// when the stores cannot be written.
    pub async fn clear_saved_inputs(
        &self,
        scope: StorageScope,
        input_id: Option<&str>,
    ) -> RegistryResult<()> {
        let storage = self.input_storage(scope);
        if let Some(key) = input_id {
            storage.clear(key).await?;
        } else {
            storage.clear_all().await?;
        }
        debug!(%scope, input_id, "cleared saved MCP inputs");
        self.announce_inputs_changed(scope);
        Ok(())
    }

    /// Stores `value` for the placeholder `input_id` without prompting.
    ///
    /// `input_id` is the raw placeholder text, e.g. `${input:apiKey}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::server_registry::domain::RegistryError::InputStorage`]
    /// when the stores cannot be written.
    pub async fn set_saved_input(
        &self,
        input_id: &str,
        target: ConfigurationTarget,
        value: &str,
    ) -> RegistryResult<()> {
        let mut expression = ConfigurationExpression::parse(Value::String(input_id.to_owned()));
        if let Some(replacement) = expression.unresolved().next() {
            expression.resolve(&replacement, value);
        }
        self.persist_resolved_inputs(self.input_storage(target.storage_scope()), &expression)
            .await?;
        Ok(())
    }

    /// Prompts again for a saved input, offering the stored value as default.
    ///
    /// Nothing is written when the prompt is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::server_registry::domain::RegistryError`] when the
    /// input cannot be resolved or the stores fail.
    pub async fn edit_saved_input(
        &self,
        input_id: &str,
        folder: Option<&WorkspaceFolder>,
        section: Option<&str>,
        target: ConfigurationTarget,
    ) -> RegistryResult<()> {
        let storage = self.input_storage(target.storage_scope());
        let stored = storage.get_map().await?;
        let defaults: Option<HashMap<String, String>> = Replacement::from_id(input_id)
            .zip(stored.get(input_id).and_then(|saved| saved.value.clone()))
            .map(|(replacement, previous)| {
                HashMap::from([(replacement.inner().to_owned(), previous)])
            });

        let mut expression = ConfigurationExpression::parse(Value::String(input_id.to_owned()));
        let answered = self
            .resolver
            .resolve_with_interaction(folder, &mut expression, section, defaults.as_ref())
            .await?;
        if answered.is_none() {
            debug!(input_id, "editing saved MCP input cancelled");
            return Ok(());
        }
        self.persist_resolved_inputs(storage, &expression).await?;
        Ok(())
    }

    /// Observes which storage scope changed after inputs are saved or cleared.
    #[must_use]
    pub fn subscribe_input_changes(&self) -> broadcast::Receiver<StorageScope> {
        self.inputs_changed.subscribe()
    }

    /// Writes every resolution recorded on `expression`.
    ///
    /// Values from password inputs go to the secret store.
    pub(super) async fn persist_resolved_inputs(
        &self,
        storage: &McpRegistryInputStorage,
        expression: &ConfigurationExpression,
    ) -> InputStorageResult<()> {
        let mut plain = StoredInputs::new();
        let mut secrets = StoredInputs::new();
        for (replacement, resolution) in expression.resolved() {
            let bucket = if resolution.is_secret() {
                &mut secrets
            } else {
                &mut plain
            };
            bucket.insert(replacement.id().to_owned(), resolution.clone());
        }
        if plain.is_empty() && secrets.is_empty() {
            return Ok(());
        }

        debug!(
            scope = %storage.scope(),
            plain = plain.len(),
            secrets = secrets.len(),
            "saving resolved MCP inputs"
        );
        storage.set_plain_text(plain).await?;
        storage.set_secrets(secrets).await?;
        self.announce_inputs_changed(storage.scope());
        Ok(())
    }

    fn announce_inputs_changed(&self, scope: StorageScope) {
        if self.inputs_changed.send(scope).is_err() {
            trace!(%scope, "no input change subscribers");
        }
    }
}
