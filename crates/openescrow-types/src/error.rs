//! Error types for the OpenEscrow custody engine.
//!
//! All errors use the `OE_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors (creation-time)
//! - 2xx: Authorization errors
//! - 3xx: Timing errors
//! - 4xx: State-conflict errors
//! - 5xx: Ledger / settlement errors
//! - 6xx: Oracle / orchestrator errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, DealId, DealStatus};

/// Central error enum for all OpenEscrow operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The custodied amount must be strictly positive.
    #[error("OE_ERR_100: Invalid amount: {amount} (must be > 0)")]
    InvalidAmount { amount: Decimal },

    /// A party field was the nil account.
    #[error("OE_ERR_101: Invalid {role} account: must not be nil")]
    InvalidParty { role: &'static str },

    /// The identity reference (off-chain subject handle) was empty.
    #[error("OE_ERR_102: Invalid identity reference: must not be empty")]
    InvalidIdentityRef,

    /// The creation policy forbids the beneficiary coinciding with this role.
    #[error("OE_ERR_103: Self-dealing rejected: beneficiary equals {role}")]
    SelfDealing { role: &'static str },

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// A decision was attempted by a principal other than the deal's verifier.
    #[error("OE_ERR_200: Caller {caller} is not the deal verifier")]
    Unauthorized { caller: AccountId },

    // =================================================================
    // Timing Errors (3xx)
    // =================================================================
    /// A decision was attempted before the verification delay elapsed.
    /// Safe to retry once `due_at` has passed.
    #[error("OE_ERR_300: Verification delay not over (decision due at {due_at})")]
    VerificationDelayActive { due_at: DateTime<Utc> },

    // =================================================================
    // State-Conflict Errors (4xx)
    // =================================================================
    /// An operation was attempted from the wrong deal status.
    #[error("OE_ERR_400: Wrong deal status: expected {expected}, got {actual}")]
    WrongStatus {
        expected: DealStatus,
        actual: DealStatus,
    },

    /// The caller holds no withdrawable entitlement on this deal.
    #[error("OE_ERR_401: Nothing to withdraw for {caller}")]
    NothingToWithdraw { caller: AccountId },

    /// The requested deal is not in the registry.
    #[error("OE_ERR_402: Deal not found: {0}")]
    DealNotFound(DealId),

    // =================================================================
    // Ledger / Settlement Errors (5xx)
    // =================================================================
    /// Not enough available balance to fund the operation.
    #[error("OE_ERR_500: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// The external value transfer failed; the entitlement was restored.
    #[error("OE_ERR_501: Payout failed: {reason}")]
    PayoutFailed { reason: String },

    // =================================================================
    // Oracle / Orchestrator Errors (6xx)
    // =================================================================
    /// The external proof oracle could not produce a verdict.
    #[error("OE_ERR_600: Oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    /// The custody gateway could not accept the call (transient).
    #[error("OE_ERR_601: Custody gateway unavailable: {reason}")]
    GatewayUnavailable { reason: String },

    /// Retries were exhausted while submitting a decision. The deal remains
    /// ACTIVE — an operator alert, never a silent skip.
    #[error("OE_ERR_602: Decision retries exhausted for {deal_id} after {attempts} attempts")]
    DecisionRetriesExhausted { deal_id: DealId, attempts: u32 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OE_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid delay, bad policy, etc.).
    #[error("OE_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;
