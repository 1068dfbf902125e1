//! Turning a registered definition into a ready-to-start connection.

use super::{McpRegistry, McpServerConnection};
use crate::expression::ConfigurationExpression;
use crate::input_storage::ConfigurationTarget;
use crate::server_registry::domain::{
    CollectionId, ConfigLocation, DefinitionId, InteractionReason, LaunchError,
    McpCollectionDefinition, McpServerDefinition, McpStartServerInteraction, RegistryError,
    RegistryResult, ServerLaunch, TrustNonceBearer, TrustPromptType,
};
use crate::server_registry::ports::{
    McpHostDelegate, Notification, NotificationAction, Severity,
};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Arguments of [`McpRegistry::resolve_connection`].
#[derive(Clone)]
pub struct ResolveConnectionOptions {
    /// Collection holding the definition.
    pub collection_id: CollectionId,
    /// Definition to connect to.
    pub definition_id: DefinitionId,
    /// Shared prompt state when several servers start together.
    pub interaction: Option<Arc<McpStartServerInteraction>>,
    /// Where the trust decision for this definition is remembered.
    pub trust_nonce_bearer: Arc<dyn TrustNonceBearer>,
    /// When the user may be asked for trust.
    pub prompt_type: TrustPromptType,
    /// Approves a changed definition without asking.
    pub auto_trust_changes: bool,
    /// Fails with [`RegistryError::InteractionRequired`] instead of prompting.
    pub error_on_user_interaction: bool,
    /// Applies the dev-mode debug transform when configured.
    pub debug: bool,
}

impl ResolveConnectionOptions {
    /// Creates options with the default prompt behaviour.
    #[must_use]
    pub fn new(
        collection_id: impl Into<CollectionId>,
        definition_id: impl Into<DefinitionId>,
        trust_nonce_bearer: Arc<dyn TrustNonceBearer>,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            definition_id: definition_id.into(),
            interaction: None,
            trust_nonce_bearer,
            prompt_type: TrustPromptType::default(),
            auto_trust_changes: false,
            error_on_user_interaction: false,
            debug: false,
        }
    }

    /// Joins a shared interaction.
    #[must_use]
    pub fn with_interaction(mut self, interaction: Arc<McpStartServerInteraction>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    /// Sets the prompt policy.
    #[must_use]
    pub const fn with_prompt_type(mut self, prompt_type: TrustPromptType) -> Self {
        self.prompt_type = prompt_type;
        self
    }

    /// Sets whether changed definitions are approved silently.
    #[must_use]
    pub const fn with_auto_trust_changes(mut self, enabled: bool) -> Self {
        self.auto_trust_changes = enabled;
        self
    }

    /// Sets whether prompting turns into an error.
    #[must_use]
    pub const fn with_error_on_user_interaction(mut self, enabled: bool) -> Self {
        self.error_on_user_interaction = enabled;
        self
    }

    /// Sets whether the dev-mode debug transform applies.
    #[must_use]
    pub const fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }
}

impl fmt::Debug for ResolveConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveConnectionOptions")
            .field("collection_id", &self.collection_id)
            .field("definition_id", &self.definition_id)
            .field("interaction", &self.interaction.is_some())
            .field("prompt_type", &self.prompt_type)
            .field("auto_trust_changes", &self.auto_trust_changes)
            .field("error_on_user_interaction", &self.error_on_user_interaction)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl<C> McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Resolves a definition into a connection that has not been started.
    ///
    /// Returns `Ok(None)` when trust is denied, a prompt is cancelled, or the
    /// launch cannot be prepared. Preparation failures are reported through
    /// the notification port rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for unknown collections, definitions, or
    /// delegates, and [`RegistryError::InteractionRequired`] when
    /// `error_on_user_interaction` forbids a needed prompt.
    pub async fn resolve_connection(
        &self,
        options: ResolveConnectionOptions,
    ) -> RegistryResult<Option<McpServerConnection>> {
        let collection = self.loaded_collection(&options.collection_id).await?;
        let definition = collection
            .server_definitions()
            .find(&options.definition_id)
            .ok_or_else(|| RegistryError::DefinitionNotFound {
                collection_id: options.collection_id.clone(),
                definition_id: options.definition_id.clone(),
            })?;
        let delegate = self
            .delegates()
            .into_iter()
            .find(|candidate| candidate.can_start(&collection, &definition))
            .ok_or_else(|| RegistryError::NoDelegate {
                collection_id: options.collection_id.clone(),
                definition_id: options.definition_id.clone(),
            })?;

        let trust_check = self.check_trust(&collection, &definition, &options).await;
        if let Some(interaction) = &options.interaction {
            interaction.mark_resolved(definition.id());
        }
        if !trust_check? {
            debug!(definition_id = %definition.id(), "MCP server not trusted");
            return Ok(None);
        }

        let launch = match self
            .prepare_launch(&collection, &definition, &delegate, &options)
            .await
        {
            Ok(Some(launch)) => launch,
            Ok(None) => {
                debug!(definition_id = %definition.id(), "MCP server launch cancelled");
                return Ok(None);
            }
            Err(LaunchError::InteractionRequired(reason)) => {
                return Err(RegistryError::InteractionRequired(reason));
            }
            Err(err) => {
                self.report_launch_failure(&collection, &definition, &err);
                return Ok(None);
            }
        };

        let clock: Arc<dyn Clock + Send + Sync> = Arc::<C>::clone(&self.clock);
        Ok(Some(McpServerConnection::new(
            collection, definition, delegate, launch, clock,
        )))
    }

    async fn loaded_collection(
        &self,
        id: &CollectionId,
    ) -> RegistryResult<Arc<McpCollectionDefinition>> {
        let found = self
            .find_collection(id)
            .ok_or_else(|| RegistryError::CollectionNotFound(id.clone()))?;
        let Some(lazy) = found.lazy_state() else {
            return Ok(found);
        };
        debug!(collection_id = %id, "loading lazy MCP collection");
        lazy.load().await;
        self.find_collection(id)
            .ok_or_else(|| RegistryError::CollectionNotFound(id.clone()))
    }

    async fn prepare_launch(
        &self,
        collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
        delegate: &Arc<dyn McpHostDelegate>,
        options: &ResolveConnectionOptions,
    ) -> Result<Option<ServerLaunch>, LaunchError> {
        let Some(base) = base_launch(collection, definition).await? else {
            return Ok(None);
        };
        let Some(launch) = self
            .replace_variables_in_launch(
                delegate,
                collection,
                definition,
                base,
                options.error_on_user_interaction,
            )
            .await?
        else {
            return Ok(None);
        };

        if options.debug
            && definition.dev_mode().is_some()
            && let Some(dev_mode) = &self.dev_mode
        {
            debug!(definition_id = %definition.id(), "applying dev-mode launch transform");
            return Ok(Some(dev_mode.transform(definition, launch).await?));
        }
        Ok(Some(launch))
    }

    async fn replace_variables_in_launch(
        &self,
        delegate: &Arc<dyn McpHostDelegate>,
        collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
        launch: ServerLaunch,
        error_on_user_interaction: bool,
    ) -> Result<Option<ServerLaunch>, LaunchError> {
        let Some(policy) = definition.variable_replacement() else {
            return Ok(Some(launch));
        };
        let scope = policy
            .target()
            .map_or_else(|| collection.scope(), ConfigurationTarget::storage_scope);
        let storage = self.input_storage(scope);

        let (stored, substituted) = tokio::join!(
            storage.get_map(),
            delegate.substitute_variables(definition, launch),
        );
        let previous_inputs = stored?;
        let mut expression = ConfigurationExpression::parse(serde_json::to_value(substituted?)?);
        for replacement in expression.unresolved() {
            if let Some(saved) = previous_inputs.get(replacement.id()) {
                expression.resolve(&replacement, saved.clone());
            }
        }

        if error_on_user_interaction && expression.unresolved().next().is_some() {
            return Err(LaunchError::InteractionRequired(InteractionReason::Variables));
        }

        let folder = policy.folder();
        let answered = self
            .resolver
            .resolve_with_interaction(folder, &mut expression, policy.section(), None)
            .await?;
        if answered.is_none() {
            return Ok(None);
        }
        self.persist_resolved_inputs(storage, &expression).await?;

        debug!(definition_id = %definition.id(), "resolving remaining launch variables");
        let resolved = self.resolver.resolve_async(folder, expression).await?;
        Ok(Some(serde_json::from_value(resolved)?))
    }

    fn report_launch_failure(
        &self,
        collection: &McpCollectionDefinition,
        definition: &McpServerDefinition,
        err: &LaunchError,
    ) {
        warn!(
            collection_id = %collection.id(),
            definition_id = %definition.id(),
            error = %err,
            "failed to prepare MCP server launch"
        );
        let actions = collection
            .origin()
            .map(|uri| NotificationAction::OpenConfiguration {
                label: "Open Configuration".to_owned(),
                location: ConfigLocation {
                    uri: uri.to_owned(),
                    range: definition.origin().and_then(|origin| origin.range),
                },
            })
            .into_iter()
            .collect();
        self.notifications.notify(Notification {
            severity: Severity::Error,
            message: format!("Error starting {}: {err}", definition.label()),
            actions,
        });
    }
}

async fn base_launch(
    collection: &McpCollectionDefinition,
    definition: &McpServerDefinition,
) -> Result<Option<ServerLaunch>, LaunchError> {
    let Some(resolver) = collection.launch_resolver() else {
        return Ok(Some(definition.launch().clone()));
    };
    Ok(resolver.resolve_server_launch(definition).await?)
}
