//! External proof oracle boundary.
//!
//! The oracle answers one question: did the off-chain subject identified by
//! `identity_ref` publish a proof containing this deal's `nonce`? The real
//! lookup (a social-media API, typically) is out of scope; everything behind
//! this trait is a black box to the orchestrator.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use openescrow_types::{EscrowError, Nonce, Result};

/// Black-box external condition check.
#[async_trait]
pub trait ProofOracle: Send + Sync {
    /// `Ok(true)` — proof found, `Ok(false)` — proof absent.
    ///
    /// # Errors
    /// [`EscrowError::OracleUnavailable`] when no verdict could be obtained;
    /// the caller retries with backoff and eventually takes its fail-safe
    /// path.
    async fn check(&self, identity_ref: &str, nonce: &Nonce) -> Result<bool>;
}

/// Deterministic oracle with preloaded per-identity verdicts.
///
/// An identity with no recorded verdict reads as "no proof found" — absence
/// of evidence is the founder-protective answer.
#[derive(Debug, Default)]
pub struct StaticOracle {
    verdicts: RwLock<HashMap<String, bool>>,
}

impl StaticOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether a proof exists for this identity.
    pub fn set_verdict(&self, identity_ref: impl Into<String>, proof_found: bool) {
        self.verdicts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity_ref.into(), proof_found);
    }
}

#[async_trait]
impl ProofOracle for StaticOracle {
    async fn check(&self, identity_ref: &str, _nonce: &Nonce) -> Result<bool> {
        let verdicts = self.verdicts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(verdicts.get(identity_ref).copied().unwrap_or(false))
    }
}

/// Oracle that always fails, for exercising retry and fail-safe paths.
#[derive(Debug, Default)]
pub struct UnavailableOracle;

#[async_trait]
impl ProofOracle for UnavailableOracle {
    async fn check(&self, _identity_ref: &str, _nonce: &Nonce) -> Result<bool> {
        Err(EscrowError::OracleUnavailable {
            reason: "lookup service unreachable".into(),
        })
    }
}
