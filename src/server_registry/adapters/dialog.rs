//! Trust prompter built on the dialog and quick-pick ports.

use crate::server_registry::domain::{ConfigLocation, DefinitionId, TrustCandidate};
use crate::server_registry::ports::{
    DialogPrompt, DialogService, QuickPickItem, QuickPickRequest, QuickPickService,
    TrustPrompter,
};
use async_trait::async_trait;
use std::sync::Arc;

const PICK_PLACEHOLDER: &str = "Select MCP servers to trust";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupChoice {
    All,
    Pick,
    None,
}

/// Asks with a confirmation dialog, falling back to a quick-pick when the
/// user wants to approve only some of several servers.
#[derive(Clone)]
pub struct DialogTrustPrompter {
    dialog: Arc<dyn DialogService>,
    quick_pick: Arc<dyn QuickPickService>,
}

impl DialogTrustPrompter {
    /// Creates a prompter.
    #[must_use]
    pub fn new(dialog: Arc<dyn DialogService>, quick_pick: Arc<dyn QuickPickService>) -> Self {
        Self { dialog, quick_pick }
    }

    async fn confirm_one(&self, candidate: &TrustCandidate) -> Option<Vec<DefinitionId>> {
        let label = candidate.definition.label();
        let trusted = DialogPrompt::new(format!("Trust and run MCP server {label}?"))
            .with_detail(format!(
                "The MCP server {} was updated. MCP servers may add context to your \
                 chat session and lead to unexpected behavior. Do you want to trust and run \
                 this server?",
                label_with_origin(candidate)
            ))
            .with_button("Trust", true)
            .with_button("Do not trust", false)
            .show(self.dialog.as_ref())
            .await?;
        Some(if trusted {
            vec![candidate.definition.id().clone()]
        } else {
            Vec::new()
        })
    }

    async fn confirm_group(&self, candidates: &[TrustCandidate]) -> Option<Vec<DefinitionId>> {
        let choice = DialogPrompt::new(format!(
            "Trust and run {} MCP servers?",
            candidates.len()
        ))
        .with_detail(format!(
            "Several updated MCP servers were discovered:\n\n{}\n\nMCP servers may add \
             context to your chat session and lead to unexpected behavior. Do you want to \
             trust and run these servers?",
            server_list(candidates)
        ))
        .with_button("Trust", GroupChoice::All)
        .with_button("Pick Trusted", GroupChoice::Pick)
        .with_button("Do not trust", GroupChoice::None)
        .show(self.dialog.as_ref())
        .await?;

        match choice {
            GroupChoice::All => Some(
                candidates
                    .iter()
                    .map(|candidate| candidate.definition.id().clone())
                    .collect(),
            ),
            GroupChoice::None => Some(Vec::new()),
            GroupChoice::Pick => self.pick(candidates).await,
        }
    }

    async fn pick(&self, candidates: &[TrustCandidate]) -> Option<Vec<DefinitionId>> {
        let request = QuickPickRequest {
            placeholder: PICK_PLACEHOLDER.to_owned(),
            items: candidates.iter().map(pick_item).collect(),
        };
        let picked = self.quick_pick.pick_many(request).await?;
        Some(picked.into_iter().map(DefinitionId::new).collect())
    }
}

/// One `- label (origin)` line per candidate.
fn server_list(candidates: &[TrustCandidate]) -> String {
    candidates
        .iter()
        .map(|candidate| format!("- {}", label_with_origin(candidate)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn label_with_origin(candidate: &TrustCandidate) -> String {
    let label = candidate.definition.label();
    let origin = candidate
        .definition
        .origin()
        .map(|location| location.uri.as_str())
        .or_else(|| candidate.collection.origin());
    let located = origin.map_or_else(|| label.to_owned(), |uri| format!("{label} ({uri})"));
    let from = candidate
        .collection
        .source()
        .map(|source| format!(" from {source}"))
        .unwrap_or_default();
    format!("{located}{from}")
}

fn pick_item(candidate: &TrustCandidate) -> QuickPickItem {
    let collection = &candidate.collection;
    let definition = &candidate.definition;
    let location = collection.origin().map(|uri| ConfigLocation {
        uri: uri.to_owned(),
        range: definition.origin().and_then(|origin| origin.range),
    });
    QuickPickItem {
        id: definition.id().as_str().to_owned(),
        label: definition.label().to_owned(),
        description: collection
            .source()
            .or_else(|| collection.origin())
            .map(str::to_owned),
        picked: false,
        location,
    }
}

#[async_trait]
impl TrustPrompter for DialogTrustPrompter {
    async fn choose_trusted(&self, candidates: Vec<TrustCandidate>) -> Option<Vec<DefinitionId>> {
        match candidates.as_slice() {
            [] => Some(Vec::new()),
            [single] => self.confirm_one(single).await,
            several => self.confirm_group(several).await,
        }
    }
}
