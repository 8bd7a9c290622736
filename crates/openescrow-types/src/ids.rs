//! Globally unique identifiers used throughout OpenEscrow.
//!
//! Deal and account IDs use UUIDv7 for time-ordered lexicographic sorting.
//! The per-deal [`Nonce`] is a domain-separated SHA-256 digest bound to the
//! deal's immutable fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// DealId
// ---------------------------------------------------------------------------

/// Globally unique deal identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DealId(pub Uuid);

impl DealId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for DealId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deal:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Unique identifier for a principal (founder, beneficiary, or verifier).
///
/// The nil UUID plays the role of the null address: it is never a valid
/// party on a deal and is rejected at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The nil account — the reject-at-creation "zero address".
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// Unique per-deal verification nonce (32 bytes, rendered as 0x-prefixed hex).
///
/// The nonce is bound into the off-chain proof check so that a proof produced
/// for one deal can never be replayed against another deal with the same
/// identity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Nonce(pub [u8; 32]);

impl Nonce {
    /// Derive a deal-bound nonce.
    ///
    /// `SHA-256(domain_sep || counter || salt || founder || beneficiary || identity_ref)`
    ///
    /// The monotone `counter` guarantees uniqueness within a registry; the
    /// random per-registry `salt` makes the value unpredictable; the deal
    /// fields bind it to exactly one deal. A bare counter alone would be
    /// both predictable and portable across registries.
    #[must_use]
    pub fn derive(
        counter: u64,
        salt: &[u8; 16],
        founder: AccountId,
        beneficiary: AccountId,
        identity_ref: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"openescrow:nonce:v1:");
        hasher.update(counter.to_le_bytes());
        hasher.update(salt);
        hasher.update(founder.0.as_bytes());
        hasher.update(beneficiary.0.as_bytes());
        hasher.update(identity_ref.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
