//! Trust checks run before a server may start.

use super::{McpRegistry, ResolveConnectionOptions};
use crate::server_registry::domain::{
    InteractionReason, McpCollectionDefinition, McpServerDefinition, McpServerTrust,
    McpStartServerInteraction, RegistryError, RegistryResult, TrustCandidate, TrustPromptType,
    TrustedNonce,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::trace;

/// Answer of one trust prompt for one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrustOutcome {
    Approved,
    Declined,
    /// The prompt was dismissed; nothing is remembered.
    Cancelled,
}

impl<C> McpRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Decides whether `definition` may run.
    ///
    /// A stored approval counts only while it matches the definition's
    /// current nonce. A remembered refusal is re-prompted only under
    /// [`TrustPromptType::AllUntrusted`]. A dismissed prompt denies this call
    /// without touching the bearer, so the next call asks again.
    pub(super) async fn check_trust(
        &self,
        collection: &Arc<McpCollectionDefinition>,
        definition: &Arc<McpServerDefinition>,
        options: &ResolveConnectionOptions,
    ) -> RegistryResult<bool> {
        if collection.trust_behavior() == McpServerTrust::Trusted {
            trace!(definition_id = %definition.id(), "collection is trusted");
            return Ok(true);
        }

        let bearer = &options.trust_nonce_bearer;
        let current = definition.cache_nonce();
        let remembered = bearer.trusted_at_nonce();

        if remembered.approves(current) {
            trace!(definition_id = %definition.id(), "server trusted at current nonce");
            return Ok(true);
        }
        if options.auto_trust_changes {
            trace!(definition_id = %definition.id(), "auto-trusting changed server");
            bearer.set_trusted_at_nonce(TrustedNonce::approved(current));
            return Ok(true);
        }
        if remembered == TrustedNonce::NotTrusted
            && options.prompt_type != TrustPromptType::AllUntrusted
        {
            trace!(definition_id = %definition.id(), "server was declined before");
            return Ok(false);
        }
        if options.prompt_type == TrustPromptType::Never {
            trace!(definition_id = %definition.id(), "trust prompts disabled");
            return Ok(false);
        }
        Self::ensure_may_prompt(options)?;

        let outcome = self.prompt_for_trust(collection, definition, options).await;
        match outcome {
            TrustOutcome::Approved => {
                bearer.set_trusted_at_nonce(TrustedNonce::approved(current));
            }
            TrustOutcome::Declined => bearer.set_trusted_at_nonce(TrustedNonce::NotTrusted),
            TrustOutcome::Cancelled => {
                trace!(definition_id = %definition.id(), "trust prompt cancelled");
            }
        }
        Ok(outcome == TrustOutcome::Approved)
    }

    const fn ensure_may_prompt(options: &ResolveConnectionOptions) -> RegistryResult<()> {
        if options.error_on_user_interaction {
            return Err(RegistryError::InteractionRequired(
                InteractionReason::ServerTrust,
            ));
        }
        Ok(())
    }

    async fn prompt_for_trust(
        &self,
        collection: &Arc<McpCollectionDefinition>,
        definition: &Arc<McpServerDefinition>,
        options: &ResolveConnectionOptions,
    ) -> TrustOutcome {
        let interaction = options
            .interaction
            .clone()
            .unwrap_or_else(|| Arc::new(McpStartServerInteraction::new()));
        interaction.mark_waiting(TrustCandidate {
            collection: Arc::clone(collection),
            definition: Arc::clone(definition),
        });

        let choice = interaction
            .choose(|waiting| self.trust_prompter.choose_trusted(waiting))
            .await;
        trace!(definition_id = %definition.id(), ?choice, "trust prompt answered");

        choice.map_or(TrustOutcome::Cancelled, |approved| {
            if approved.contains(definition.id()) {
                TrustOutcome::Approved
            } else {
                TrustOutcome::Declined
            }
        })
    }
}
