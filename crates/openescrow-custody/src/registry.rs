//! Deal registry (factory) — creates, funds, and enumerates deals.
//!
//! The registry validates creation atomically (no partial effects), debits
//! the founder's treasury balance, mints the deal-bound nonce, and stores
//! the deal in an arena of independently-lockable entries: operations on
//! one deal never serialize against another.
//!
//! Registry-level `release` / `refund` / `withdraw` wrap the deal state
//! machine and append the resulting notification to the event log, so the
//! log stays the single source of truth for resumption.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::Utc;
use openescrow_types::{
    AccountId, CustodyConfig, DealCreated, DealEvent, DealId, DealStatus, EscrowError, Nonce,
    Result,
};
use rust_decimal::Decimal;

use crate::{deal::Deal, ledger::Treasury, log::EventLog};

/// Owns the set of all deals, the creation log, and the nonce scheme.
pub struct DealRegistry {
    config: CustodyConfig,
    deals: RwLock<HashMap<DealId, Arc<Mutex<Deal>>>>,
    log: EventLog,
    treasury: Arc<Mutex<Treasury>>,
    /// Monotone counter feeding nonce derivation.
    nonce_counter: AtomicU64,
    /// Random per-registry salt making nonces unpredictable.
    nonce_salt: [u8; 16],
}

impl DealRegistry {
    #[must_use]
    pub fn new(config: CustodyConfig, treasury: Arc<Mutex<Treasury>>) -> Self {
        Self {
            config,
            deals: RwLock::new(HashMap::new()),
            log: EventLog::new(),
            treasury,
            nonce_counter: AtomicU64::new(0),
            nonce_salt: rand::random(),
        }
    }

    /// Create a new deal in ACTIVE status, funded by the founder.
    ///
    /// Validation is atomic: on any failure no funds move, no deal is
    /// stored, and no event is emitted.
    ///
    /// # Errors
    /// - [`EscrowError::InvalidAmount`] if `amount <= 0`
    /// - [`EscrowError::InvalidParty`] if any principal is the nil account
    /// - [`EscrowError::InvalidIdentityRef`] if `identity_ref` is empty
    /// - [`EscrowError::SelfDealing`] per the creation policy
    /// - [`EscrowError::InsufficientFunds`] if the founder cannot cover `amount`
    pub fn create(
        &self,
        founder: AccountId,
        beneficiary: AccountId,
        identity_ref: &str,
        verifier: AccountId,
        amount: Decimal,
    ) -> Result<DealId> {
        if amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount { amount });
        }
        if founder.is_nil() {
            return Err(EscrowError::InvalidParty { role: "founder" });
        }
        if beneficiary.is_nil() {
            return Err(EscrowError::InvalidParty {
                role: "beneficiary",
            });
        }
        if verifier.is_nil() {
            return Err(EscrowError::InvalidParty { role: "verifier" });
        }
        if identity_ref.trim().is_empty() {
            return Err(EscrowError::InvalidIdentityRef);
        }
        if self.config.policy.forbid_self_dealing {
            if beneficiary == founder {
                return Err(EscrowError::SelfDealing { role: "founder" });
            }
            if beneficiary == verifier {
                return Err(EscrowError::SelfDealing { role: "verifier" });
            }
        }
        let delay = chrono::Duration::from_std(self.config.verification_delay)
            .map_err(|err| EscrowError::Configuration(err.to_string()))?;

        // Value attached atomically: the founder funds the deal or creation
        // fails with the treasury untouched.
        self.treasury
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .debit(founder, amount)?;

        let counter = self.nonce_counter.fetch_add(1, Ordering::Relaxed);
        let nonce = Nonce::derive(counter, &self.nonce_salt, founder, beneficiary, identity_ref);
        let id = DealId::new();
        let now = Utc::now();
        let deal = Deal {
            id,
            founder,
            beneficiary,
            verifier,
            amount,
            identity_ref: identity_ref.to_string(),
            nonce,
            created_at: now,
            decision_due_at: now + delay,
            status: DealStatus::Active,
            held: amount,
            payable: None,
        };

        self.deals
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(deal)));
        self.log.append(DealEvent::Created(DealCreated {
            deal_id: id,
            founder,
            beneficiary,
            amount,
            identity_ref: identity_ref.to_string(),
            nonce,
        }));

        tracing::info!(
            deal = %id,
            founder = %founder,
            beneficiary = %beneficiary,
            amount = %amount,
            identity = identity_ref,
            nonce = nonce.short(),
            "Deal created"
        );
        Ok(id)
    }

    /// Handle to one deal's independently-lockable entry.
    pub fn get(&self, deal_id: DealId) -> Result<Arc<Mutex<Deal>>> {
        self.deals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&deal_id)
            .cloned()
            .ok_or(EscrowError::DealNotFound(deal_id))
    }

    /// Current status of one deal.
    pub fn status(&self, deal_id: DealId) -> Result<DealStatus> {
        let handle = self.get(deal_id)?;
        let deal = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(deal.status)
    }

    /// All deal ids, in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<DealId> {
        let mut ids: Vec<DealId> = self
            .deals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.deals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The append-only notification log.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Total value currently custodied across all deals.
    #[must_use]
    pub fn total_held(&self) -> Decimal {
        let deals = self.deals.read().unwrap_or_else(PoisonError::into_inner);
        deals
            .values()
            .map(|handle| {
                handle
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .held
            })
            .sum()
    }

    /// Verifier-gated release; appends the `Released` notification.
    pub fn release(&self, deal_id: DealId, caller: AccountId) -> Result<()> {
        let handle = self.get(deal_id)?;
        let event = {
            let mut deal = handle.lock().unwrap_or_else(PoisonError::into_inner);
            deal.release(caller, Utc::now())?
        };
        self.log.append(event);
        tracing::info!(deal = %deal_id, "Released");
        Ok(())
    }

    /// Verifier-gated refund; appends the `Refunded` notification.
    pub fn refund(&self, deal_id: DealId, caller: AccountId, reason: &str) -> Result<()> {
        let handle = self.get(deal_id)?;
        let event = {
            let mut deal = handle.lock().unwrap_or_else(PoisonError::into_inner);
            deal.refund(caller, Utc::now(), reason)?
        };
        self.log.append(event);
        tracing::info!(deal = %deal_id, reason, "Refunded");
        Ok(())
    }

    /// Pull-payment settlement: pays the caller's entitlement into the
    /// treasury and completes the deal.
    pub fn withdraw(&self, deal_id: DealId, caller: AccountId) -> Result<Decimal> {
        let handle = self.get(deal_id)?;
        let mut deal = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let mut treasury = self.treasury.lock().unwrap_or_else(PoisonError::into_inner);
        let amount = deal.withdraw(caller, &mut *treasury)?;
        tracing::info!(deal = %deal_id, to = %caller, amount = %amount, "Withdrawn");
        Ok(amount)
    }
}
