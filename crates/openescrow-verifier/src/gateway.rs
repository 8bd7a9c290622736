//! Custody Plane boundary.
//!
//! The orchestrator consumes the notification stream and current deal state
//! through this trait and produces release/refund invocations under the
//! verifier's account credential — one credential shared across all deals.
//! Transient delivery failures surface as
//! [`EscrowError::GatewayUnavailable`](openescrow_types::EscrowError) so the
//! service can retry them apart from state conflicts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openescrow_custody::DealRegistry;
use openescrow_types::{AccountId, DealEvent, DealId, DealStatus, Result};
use tokio::sync::broadcast;

/// Read-model of one deal: exactly what decision scheduling needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealBrief {
    pub deal_id: DealId,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub decision_due_at: DateTime<Utc>,
}

/// Boundary between the Verifier Plane and the Custody Plane.
#[async_trait]
pub trait CustodyGateway: Send + Sync {
    /// Historical creation log plus a live receiver, with no gap between
    /// them. Replay the snapshot first, then drain the channel.
    fn subscribe(&self) -> (Vec<DealEvent>, broadcast::Receiver<DealEvent>);

    /// Current state of one deal.
    async fn brief(&self, deal_id: DealId) -> Result<DealBrief>;

    /// Issue a release decision as the verifier.
    async fn release(&self, deal_id: DealId) -> Result<()>;

    /// Issue a refund decision as the verifier.
    async fn refund(&self, deal_id: DealId, reason: &str) -> Result<()>;
}

/// In-process gateway driving a [`DealRegistry`] directly.
pub struct LocalGateway {
    registry: Arc<DealRegistry>,
    /// The verifier's authority credential, used for every decision.
    verifier: AccountId,
}

impl LocalGateway {
    #[must_use]
    pub fn new(registry: Arc<DealRegistry>, verifier: AccountId) -> Self {
        Self { registry, verifier }
    }
}

#[async_trait]
impl CustodyGateway for LocalGateway {
    fn subscribe(&self) -> (Vec<DealEvent>, broadcast::Receiver<DealEvent>) {
        self.registry.events().subscribe()
    }

    async fn brief(&self, deal_id: DealId) -> Result<DealBrief> {
        let handle = self.registry.get(deal_id)?;
        let deal = handle.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(DealBrief {
            deal_id,
            status: deal.status,
            created_at: deal.created_at,
            decision_due_at: deal.decision_due_at,
        })
    }

    async fn release(&self, deal_id: DealId) -> Result<()> {
        self.registry.release(deal_id, self.verifier)
    }

    async fn refund(&self, deal_id: DealId, reason: &str) -> Result<()> {
        self.registry.refund(deal_id, self.verifier, reason)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use openescrow_custody::Treasury;
    use openescrow_types::{CustodyConfig, EscrowError};
    use rust_decimal::Decimal;

    use super::*;

    fn registry_with_deal() -> (Arc<DealRegistry>, DealId, AccountId) {
        let treasury = Arc::new(Mutex::new(Treasury::new()));
        let founder = AccountId::new();
        treasury.lock().unwrap().deposit(founder, Decimal::ONE);
        let config = CustodyConfig {
            verification_delay: Duration::from_millis(0),
            ..CustodyConfig::default()
        };
        let registry = Arc::new(DealRegistry::new(config, treasury));
        let verifier = AccountId::new();
        let deal_id = registry
            .create(founder, AccountId::new(), "testhandle", verifier, Decimal::ONE)
            .unwrap();
        (registry, deal_id, verifier)
    }

    #[tokio::test]
    async fn brief_reflects_deal_state() {
        let (registry, deal_id, verifier) = registry_with_deal();
        let gateway = LocalGateway::new(Arc::clone(&registry), verifier);

        let brief = gateway.brief(deal_id).await.unwrap();
        assert_eq!(brief.deal_id, deal_id);
        assert_eq!(brief.status, DealStatus::Active);
        assert_eq!(brief.created_at, brief.decision_due_at);
    }

    #[tokio::test]
    async fn brief_unknown_deal_fails() {
        let (registry, _, verifier) = registry_with_deal();
        let gateway = LocalGateway::new(registry, verifier);
        let err = gateway.brief(DealId::new()).await.unwrap_err();
        assert!(matches!(err, EscrowError::DealNotFound(_)));
    }

    #[tokio::test]
    async fn release_uses_verifier_credential() {
        let (registry, deal_id, verifier) = registry_with_deal();
        let gateway = LocalGateway::new(Arc::clone(&registry), verifier);

        gateway.release(deal_id).await.unwrap();
        assert_eq!(registry.status(deal_id).unwrap(), DealStatus::Released);
    }

    #[tokio::test]
    async fn wrong_credential_is_rejected() {
        let (registry, deal_id, _) = registry_with_deal();
        let gateway = LocalGateway::new(Arc::clone(&registry), AccountId::new());

        let err = gateway.refund(deal_id, "nope").await.unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
        assert_eq!(registry.status(deal_id).unwrap(), DealStatus::Active);
    }

    #[tokio::test]
    async fn subscribe_replays_creation() {
        let (registry, deal_id, verifier) = registry_with_deal();
        let gateway = LocalGateway::new(registry, verifier);

        let (history, _rx) = gateway.subscribe();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].deal_id(), deal_id);
    }
}
