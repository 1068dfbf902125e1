//! Grouping of concurrent trust prompts into one dialog.

use super::{DefinitionId, McpCollectionDefinition, McpServerDefinition};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, watch};

/// A definition waiting for the user's trust decision.
#[derive(Debug, Clone)]
pub struct TrustCandidate {
    /// Collection the definition belongs to.
    pub collection: Arc<McpCollectionDefinition>,
    /// Definition awaiting approval.
    pub definition: Arc<McpServerDefinition>,
}

#[derive(Debug, Clone)]
enum ParticipantState {
    Unknown,
    Waiting(TrustCandidate),
    Resolved,
}

/// Shared state of one user action that starts several servers.
///
/// Every `resolve_connection` call handed the same interaction joins it as a
/// participant. Once no participant is still undecided, the first caller to
/// need a prompt asks about every waiting definition at once, and all
/// participants read that single memoised answer.
pub struct McpStartServerInteraction {
    participants: watch::Sender<BTreeMap<DefinitionId, ParticipantState>>,
    choice: OnceCell<Option<Vec<DefinitionId>>>,
}

impl McpStartServerInteraction {
    /// Creates an interaction without participants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            participants: watch::Sender::new(BTreeMap::new()),
            choice: OnceCell::new(),
        }
    }

    /// Announces a definition that will be resolved as part of this action.
    ///
    /// Prompting waits until every announced definition has either joined the
    /// prompt or finished its trust check.
    pub fn add_participant(&self, definition_id: DefinitionId) {
        self.participants.send_modify(|participants| {
            participants
                .entry(definition_id)
                .or_insert(ParticipantState::Unknown);
        });
    }

    /// Returns the memoised choice: `None` before prompting, `Some(None)`
    /// when the prompt was cancelled.
    #[must_use]
    pub fn choice(&self) -> Option<Option<Vec<DefinitionId>>> {
        self.choice.get().cloned()
    }

    pub(crate) fn mark_waiting(&self, candidate: TrustCandidate) {
        self.participants.send_modify(|participants| {
            participants.insert(
                candidate.definition.id().clone(),
                ParticipantState::Waiting(candidate),
            );
        });
    }

    pub(crate) fn mark_resolved(&self, definition_id: &DefinitionId) {
        self.participants.send_modify(|participants| {
            participants.insert(definition_id.clone(), ParticipantState::Resolved);
        });
    }

    /// Waits for undecided participants, then returns the shared choice,
    /// running `prompt` over the waiting definitions if nobody has yet.
    pub(crate) async fn choose<F, Fut>(&self, prompt: F) -> Option<Vec<DefinitionId>>
    where
        F: FnOnce(Vec<TrustCandidate>) -> Fut,
        Fut: Future<Output = Option<Vec<DefinitionId>>>,
    {
        let mut participants = self.participants.subscribe();
        let waiting = participants
            .wait_for(|states| {
                !states
                    .values()
                    .any(|state| matches!(state, ParticipantState::Unknown))
            })
            .await
            .map_or_else(|_| Vec::new(), |states| collect_waiting(&states));
        self.choice.get_or_init(|| prompt(waiting)).await.clone()
    }
}

fn collect_waiting(states: &BTreeMap<DefinitionId, ParticipantState>) -> Vec<TrustCandidate> {
    states
        .values()
        .filter_map(|state| match state {
            ParticipantState::Waiting(candidate) => Some(candidate.clone()),
            ParticipantState::Unknown | ParticipantState::Resolved => None,
        })
        .collect()
}

impl Default for McpStartServerInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for McpStartServerInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpStartServerInteraction")
            .field("participants", &self.participants.borrow().len())
            .field("choice", &self.choice.get())
            .finish()
    }
}
