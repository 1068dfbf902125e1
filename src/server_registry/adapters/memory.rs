//! In-memory adapters for trust, notifications, and headless prompting.

use crate::server_registry::domain::{DefinitionId, TrustCandidate, TrustNonceBearer, TrustedNonce};
use crate::server_registry::ports::{Notification, NotificationService, TrustPrompter};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError, RwLock};

/// Trust bearer that keeps its decision in memory.
#[derive(Debug, Default)]
pub struct InMemoryTrustNonceBearer {
    nonce: RwLock<TrustedNonce>,
}

impl InMemoryTrustNonceBearer {
    /// Creates a bearer that has never been asked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bearer that already remembers `nonce`.
    #[must_use]
    pub const fn with_nonce(nonce: TrustedNonce) -> Self {
        Self {
            nonce: RwLock::new(nonce),
        }
    }
}

impl TrustNonceBearer for InMemoryTrustNonceBearer {
    fn trusted_at_nonce(&self) -> TrustedNonce {
        self.nonce
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_trusted_at_nonce(&self, nonce: TrustedNonce) {
        *self.nonce.write().unwrap_or_else(PoisonError::into_inner) = nonce;
    }
}

/// Notification sink that records everything it is shown.
#[derive(Debug, Default)]
pub struct RecordingNotificationService {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotificationService {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notification shown so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationService for RecordingNotificationService {
    fn notify(&self, notification: Notification) {
        tracing::debug!(severity = ?notification.severity, message = %notification.message, "notification");
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Prompter that answers from a fixed policy without asking anyone.
///
/// Useful for headless runs where trust is configured up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticTrustPrompter {
    /// Approves every candidate.
    TrustAll,
    /// Declines every candidate.
    TrustNone,
    /// Approves only the listed definitions.
    TrustOnly(BTreeSet<DefinitionId>),
    /// Behaves as if the prompt was dismissed.
    Cancel,
}

#[async_trait]
impl TrustPrompter for StaticTrustPrompter {
    async fn choose_trusted(&self, candidates: Vec<TrustCandidate>) -> Option<Vec<DefinitionId>> {
        let ids = candidates
            .into_iter()
            .map(|candidate| candidate.definition.id().clone());
        match self {
            Self::TrustAll => Some(ids.collect()),
            Self::TrustNone => Some(Vec::new()),
            Self::TrustOnly(allowed) => Some(ids.filter(|id| allowed.contains(id)).collect()),
            Self::Cancel => None,
        }
    }
}
