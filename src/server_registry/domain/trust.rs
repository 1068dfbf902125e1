//! Remembered trust decisions.

use super::CacheNonce;
use serde::{Deserialize, Serialize};

/// What a trust bearer remembers about a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "nonce")]
pub enum TrustedNonce {
    /// The user was never asked.
    #[default]
    Unknown,
    /// The user approved the definition at this nonce.
    Nonce(String),
    /// The user explicitly declined.
    NotTrusted,
}

impl TrustedNonce {
    /// Remembers approval of `nonce`.
    #[must_use]
    pub fn approved(nonce: &CacheNonce) -> Self {
        Self::Nonce(nonce.as_str().to_owned())
    }

    /// Returns `true` when the remembered approval covers `nonce`.
    #[must_use]
    pub fn approves(&self, nonce: &CacheNonce) -> bool {
        matches!(self, Self::Nonce(remembered) if remembered == nonce.as_str())
    }
}

/// Caller-owned storage of one definition's trust decision.
pub trait TrustNonceBearer: Send + Sync {
    /// Returns the remembered decision.
    fn trusted_at_nonce(&self) -> TrustedNonce;

    /// Replaces the remembered decision.
    fn set_trusted_at_nonce(&self, nonce: TrustedNonce);
}

/// When the registry may ask the user for trust.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustPromptType {
    /// Never prompt; unapproved servers are denied.
    Never,
    /// Prompt for servers the user has not declined before.
    #[default]
    OnlyNew,
    /// Prompt even for servers the user declined before.
    AllUntrusted,
}
