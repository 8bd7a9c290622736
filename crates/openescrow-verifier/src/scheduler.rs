//! Decision scheduling primitives.
//!
//! A [`PendingDecision`] is the unit of orchestrator work: one per deal,
//! created from a `DealCreated` notification plus the deal's due time, and
//! consumed once a decision is durably issued. It carries everything needed
//! to re-check, wait, and decide — so the whole schedule is reconstructable
//! from the creation log and current deal statuses after a restart.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use openescrow_types::{DealCreated, DealId, Nonce};

/// One scheduled decision.
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub deal_id: DealId,
    pub identity_ref: String,
    pub nonce: Nonce,
    /// When the decision may first be issued.
    pub due_at: DateTime<Utc>,
    /// Oracle attempts spent on this entry.
    pub attempts: u32,
}

impl PendingDecision {
    #[must_use]
    pub fn new(created: &DealCreated, due_at: DateTime<Utc>) -> Self {
        Self {
            deal_id: created.deal_id,
            identity_ref: created.identity_ref.clone(),
            nonce: created.nonce,
            due_at,
            attempts: 0,
        }
    }

    /// Time left before the decision is due; zero once past due.
    #[must_use]
    pub fn remaining_wait(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.due_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

/// How a scheduled decision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Proof found; funds released to the beneficiary.
    Released,
    /// Proof absent or oracle fail-safe; founder refunded.
    Refunded,
    /// Another actor decided first — a benign race, not an error.
    AlreadySettled,
    /// The decision could not be delivered; the deal stays ACTIVE and an
    /// operator alert was raised.
    Abandoned,
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::AlreadySettled => write!(f, "ALREADY_SETTLED"),
            Self::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// At-most-one scheduled decision per deal within a service instance.
///
/// Claims are never released on success — a decided deal must not be
/// re-scheduled by a log replay or a lagged-stream resync.
#[derive(Debug, Default)]
pub struct InFlight {
    set: Mutex<HashSet<DealId>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a deal for decision. Returns `false` if already claimed.
    pub fn claim(&self, deal_id: DealId) -> bool {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(deal_id)
    }

    #[must_use]
    pub fn contains(&self, deal_id: DealId) -> bool {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&deal_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
