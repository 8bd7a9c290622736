//! Notification types for the OpenEscrow audit trail.
//!
//! Every deal-level state change produces a [`DealEvent`] appended to the
//! registry's durable, replayable log. The verifier orchestrator consumes
//! this log to rebuild pending work after a restart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, DealId, Nonce};

/// Emitted when the registry creates a new deal in ACTIVE status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCreated {
    pub deal_id: DealId,
    pub founder: AccountId,
    pub beneficiary: AccountId,
    pub amount: Decimal,
    /// Opaque handle of the off-chain subject to verify (e.g. a social handle).
    pub identity_ref: String,
    /// Deal-bound verification nonce the proof must contain.
    pub nonce: Nonce,
}

/// A deal-level notification. Append-only, queryable, subscribable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealEvent {
    /// A new deal entered custody.
    Created(DealCreated),
    /// The verifier decided in the beneficiary's favor.
    Released {
        deal_id: DealId,
        beneficiary: AccountId,
        amount: Decimal,
    },
    /// The verifier decided against the beneficiary.
    Refunded {
        deal_id: DealId,
        founder: AccountId,
        amount: Decimal,
        reason: String,
    },
}

impl DealEvent {
    /// The deal this event belongs to.
    #[must_use]
    pub fn deal_id(&self) -> DealId {
        match self {
            Self::Created(c) => c.deal_id,
            Self::Released { deal_id, .. } | Self::Refunded { deal_id, .. } => *deal_id,
        }
    }

    /// Event kind label for structured logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "DEAL_CREATED",
            Self::Released { .. } => "RELEASED",
            Self::Refunded { .. } => "REFUNDED",
        }
    }
}
