//! The per-deal custody state machine.
//!
//! A [`Deal`] owns one custody entry: three principals, a fixed amount, and
//! a monotone lifecycle (`ACTIVE → RELEASED|REFUNDED → COMPLETED`). The
//! decision operations are gated on the verifier role and the verification
//! delay; settlement is pull-based — a decision only records a withdrawable
//! entitlement, and the entitled party later triggers the payout.
//!
//! The entitlement is cleared *before* the external transfer runs and
//! restored if the transfer fails, so the payout happens exactly once and
//! can never be lost.

use chrono::{DateTime, Utc};
use openescrow_types::{
    AccountId, DealEvent, DealId, DealStatus, EscrowError, Nonce, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::PayoutSink;

/// The at-most-one withdrawable entitlement on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payable {
    pub account: AccountId,
    pub amount: Decimal,
}

/// One custody entry: founder, beneficiary, verifier, and a fixed amount.
///
/// Never destroyed — after payout it persists in `COMPLETED` status as an
/// audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    /// Unique, immutable, assigned at creation.
    pub id: DealId,
    /// The funding party. Entitled to the amount on refund.
    pub founder: AccountId,
    /// The counterparty. Entitled to the amount on release.
    pub beneficiary: AccountId,
    /// The only principal authorized to decide release or refund.
    pub verifier: AccountId,
    /// Custodied value, fixed at creation. Never changes.
    pub amount: Decimal,
    /// Opaque handle of the off-chain subject to verify.
    pub identity_ref: String,
    /// Deal-bound verification nonce.
    pub nonce: Nonce,
    pub created_at: DateTime<Utc>,
    /// `created_at + verification_delay`, fixed at creation.
    pub decision_due_at: DateTime<Utc>,
    pub status: DealStatus,
    /// Value still custodied by this deal.
    pub held: Decimal,
    /// The pending payable entry, if a decision has been issued.
    pub payable: Option<Payable>,
}

impl Deal {
    /// Gate shared by `release` and `refund`: verifier-only, ACTIVE-only,
    /// and never before the verification delay elapses.
    fn authorize_decision(&self, caller: AccountId, now: DateTime<Utc>) -> Result<()> {
        if caller != self.verifier {
            return Err(EscrowError::Unauthorized { caller });
        }
        if self.status != DealStatus::Active {
            return Err(EscrowError::WrongStatus {
                expected: DealStatus::Active,
                actual: self.status,
            });
        }
        if now < self.decision_due_at {
            return Err(EscrowError::VerificationDelayActive {
                due_at: self.decision_due_at,
            });
        }
        Ok(())
    }

    /// Decide in the beneficiary's favor.
    ///
    /// Records the beneficiary's withdrawable entitlement and returns the
    /// `Released` notification for the registry log.
    pub fn release(&mut self, caller: AccountId, now: DateTime<Utc>) -> Result<DealEvent> {
        self.authorize_decision(caller, now)?;
        self.status = DealStatus::Released;
        self.payable = Some(Payable {
            account: self.beneficiary,
            amount: self.amount,
        });
        tracing::debug!(deal = %self.id, beneficiary = %self.beneficiary, "Deal released");
        Ok(DealEvent::Released {
            deal_id: self.id,
            beneficiary: self.beneficiary,
            amount: self.amount,
        })
    }

    /// Decide against the beneficiary.
    ///
    /// Records the founder's withdrawable entitlement and returns the
    /// `Refunded` notification for the registry log.
    pub fn refund(
        &mut self,
        caller: AccountId,
        now: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<DealEvent> {
        self.authorize_decision(caller, now)?;
        let reason = reason.into();
        self.status = DealStatus::Refunded;
        self.payable = Some(Payable {
            account: self.founder,
            amount: self.amount,
        });
        tracing::debug!(deal = %self.id, founder = %self.founder, reason = %reason, "Deal refunded");
        Ok(DealEvent::Refunded {
            deal_id: self.id,
            founder: self.founder,
            amount: self.amount,
            reason,
        })
    }

    /// Pay out the caller's entitlement through `sink`.
    ///
    /// Strict order: the entitlement is read and cleared *before* the
    /// external transfer. If the transfer fails the entitlement is restored
    /// and the failure surfaced, so it is never lost. On success the deal's
    /// residual custody reaches zero and the status becomes `COMPLETED`.
    ///
    /// # Errors
    /// Returns [`EscrowError::NothingToWithdraw`] unless the caller owns the
    /// non-zero payable entry — which also covers withdrawal while ACTIVE
    /// and a second withdrawal after payout.
    pub fn withdraw(&mut self, caller: AccountId, sink: &mut dyn PayoutSink) -> Result<Decimal> {
        let entitlement = match self.payable {
            Some(p) if p.account == caller && !p.amount.is_zero() => p,
            _ => return Err(EscrowError::NothingToWithdraw { caller }),
        };

        // Clear the entitlement first: a re-entrant or repeated call during
        // the transfer finds nothing to withdraw.
        self.payable = None;

        if let Err(err) = sink.transfer(entitlement.account, entitlement.amount) {
            self.payable = Some(entitlement);
            tracing::warn!(deal = %self.id, error = %err, "Payout failed; entitlement restored");
            return Err(err);
        }

        self.held -= entitlement.amount;
        if self.held.is_zero() && self.status.can_transition_to(DealStatus::Completed) {
            self.status = DealStatus::Completed;
        }
        tracing::debug!(deal = %self.id, to = %entitlement.account, amount = %entitlement.amount, "Payout complete");
        Ok(entitlement.amount)
    }

    /// Whether the verification delay has elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.decision_due_at
    }

    /// The party currently entitled to withdraw, if any.
    #[must_use]
    pub fn entitled(&self) -> Option<AccountId> {
        self.payable.map(|p| p.account)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    struct RejectingSink;

    impl PayoutSink for RejectingSink {
        fn transfer(&mut self, _to: AccountId, _amount: Decimal) -> Result<()> {
            Err(EscrowError::PayoutFailed {
                reason: "recipient rejected transfer".into(),
            })
        }
    }

    /// Sink that records transfers, for asserting payout exactness.
    #[derive(Default)]
    struct RecordingSink {
        transfers: Vec<(AccountId, Decimal)>,
    }

    impl PayoutSink for RecordingSink {
        fn transfer(&mut self, to: AccountId, amount: Decimal) -> Result<()> {
            self.transfers.push((to, amount));
            Ok(())
        }
    }

    fn one() -> Decimal {
        Decimal::ONE
    }

    /// A deal created two hours ago whose delay just elapsed.
    fn due_deal() -> Deal {
        let created_at = Utc::now() - Duration::hours(2);
        Deal {
            id: DealId::new(),
            founder: AccountId::new(),
            beneficiary: AccountId::new(),
            verifier: AccountId::new(),
            amount: one(),
            identity_ref: "testhandle".to_string(),
            nonce: Nonce::from_bytes([1u8; 32]),
            created_at,
            decision_due_at: created_at + Duration::hours(2),
            status: DealStatus::Active,
            held: one(),
            payable: None,
        }
    }

    /// A deal whose delay has not yet elapsed.
    fn pending_deal() -> Deal {
        let mut deal = due_deal();
        deal.created_at = Utc::now();
        deal.decision_due_at = deal.created_at + Duration::hours(2);
        deal
    }

    #[test]
    fn release_after_delay_credits_beneficiary() {
        let mut deal = due_deal();
        let event = deal.release(deal.verifier, Utc::now()).unwrap();

        assert_eq!(deal.status, DealStatus::Released);
        assert_eq!(deal.entitled(), Some(deal.beneficiary));
        assert!(matches!(
            event,
            DealEvent::Released { beneficiary, amount, .. }
                if beneficiary == deal.beneficiary && amount == one()
        ));
    }

    #[test]
    fn release_before_delay_rejected() {
        let mut deal = pending_deal();
        let err = deal.release(deal.verifier, Utc::now()).unwrap_err();
        assert!(matches!(err, EscrowError::VerificationDelayActive { .. }));
        assert_eq!(deal.status, DealStatus::Active);
        assert!(deal.payable.is_none());
    }

    #[test]
    fn release_exactly_at_due_time_succeeds() {
        let mut deal = pending_deal();
        assert!(deal.release(deal.verifier, deal.decision_due_at).is_ok());
    }

    #[test]
    fn release_by_non_verifier_rejected() {
        let mut deal = due_deal();
        let stranger = AccountId::new();
        let err = deal.release(stranger, Utc::now()).unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { caller } if caller == stranger));

        // Neither founder nor beneficiary may decide.
        let founder = deal.founder;
        assert!(deal.release(founder, Utc::now()).is_err());
        let beneficiary = deal.beneficiary;
        assert!(deal.release(beneficiary, Utc::now()).is_err());
    }

    #[test]
    fn refund_credits_founder_with_reason() {
        let mut deal = due_deal();
        let event = deal.refund(deal.verifier, Utc::now(), "no proof").unwrap();

        assert_eq!(deal.status, DealStatus::Refunded);
        assert_eq!(deal.entitled(), Some(deal.founder));
        assert!(matches!(
            event,
            DealEvent::Refunded { founder, amount, ref reason, .. }
                if founder == deal.founder && amount == one() && reason == "no proof"
        ));
    }

    #[test]
    fn refund_before_delay_rejected() {
        let mut deal = pending_deal();
        let err = deal
            .refund(deal.verifier, Utc::now(), "too early")
            .unwrap_err();
        assert!(matches!(err, EscrowError::VerificationDelayActive { .. }));
    }

    #[test]
    fn second_decision_rejected() {
        let mut deal = due_deal();
        deal.release(deal.verifier, Utc::now()).unwrap();

        let err = deal.release(deal.verifier, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            EscrowError::WrongStatus { actual: DealStatus::Released, .. }
        ));
        let err = deal
            .refund(deal.verifier, Utc::now(), "flip")
            .unwrap_err();
        assert!(matches!(err, EscrowError::WrongStatus { .. }));
        assert_eq!(deal.status, DealStatus::Released);
    }

    #[test]
    fn withdraw_while_active_rejected() {
        let mut deal = due_deal();
        let mut sink = RecordingSink::default();
        let beneficiary = deal.beneficiary;
        let founder = deal.founder;

        let err = deal.withdraw(beneficiary, &mut sink).unwrap_err();
        assert!(matches!(err, EscrowError::NothingToWithdraw { .. }));
        assert!(deal.withdraw(founder, &mut sink).is_err());
        assert!(sink.transfers.is_empty());
    }

    #[test]
    fn withdraw_pays_exactly_once() {
        let mut deal = due_deal();
        deal.release(deal.verifier, Utc::now()).unwrap();
        let beneficiary = deal.beneficiary;

        let mut sink = RecordingSink::default();
        let paid = deal.withdraw(beneficiary, &mut sink).unwrap();
        assert_eq!(paid, one());
        assert_eq!(sink.transfers, vec![(beneficiary, one())]);
        assert_eq!(deal.held, Decimal::ZERO);
        assert_eq!(deal.status, DealStatus::Completed);

        // Second withdrawal finds nothing.
        let err = deal.withdraw(beneficiary, &mut sink).unwrap_err();
        assert!(matches!(err, EscrowError::NothingToWithdraw { .. }));
        assert_eq!(sink.transfers.len(), 1);
    }

    #[test]
    fn withdraw_by_wrong_party_rejected() {
        let mut deal = due_deal();
        deal.release(deal.verifier, Utc::now()).unwrap();

        let mut sink = RecordingSink::default();
        let founder = deal.founder;
        let err = deal.withdraw(founder, &mut sink).unwrap_err();
        assert!(matches!(err, EscrowError::NothingToWithdraw { caller } if caller == founder));

        // The beneficiary's entitlement is intact.
        assert_eq!(deal.entitled(), Some(deal.beneficiary));
    }

    #[test]
    fn failed_transfer_restores_entitlement() {
        let mut deal = due_deal();
        deal.refund(deal.verifier, Utc::now(), "no proof").unwrap();
        let founder = deal.founder;

        let err = deal.withdraw(founder, &mut RejectingSink).unwrap_err();
        assert!(matches!(err, EscrowError::PayoutFailed { .. }));

        // Entitlement restored; deal not completed; retry succeeds.
        assert_eq!(deal.entitled(), Some(founder));
        assert_eq!(deal.status, DealStatus::Refunded);
        assert_eq!(deal.held, one());

        let mut sink = RecordingSink::default();
        assert_eq!(deal.withdraw(founder, &mut sink).unwrap(), one());
        assert_eq!(deal.status, DealStatus::Completed);
    }

    #[test]
    fn is_due_tracks_deadline() {
        let deal = pending_deal();
        assert!(!deal.is_due(Utc::now()));
        assert!(deal.is_due(deal.decision_due_at));
        assert!(deal.is_due(deal.decision_due_at + Duration::seconds(1)));
    }

    #[test]
    fn serde_roundtrip() {
        let deal = due_deal();
        let json = serde_json::to_string(&deal).unwrap();
        let back: Deal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, deal.id);
        assert_eq!(back.status, deal.status);
        assert_eq!(back.amount, deal.amount);
        assert_eq!(back.nonce, deal.nonce);
    }
}
