//! The verifier orchestrator service.
//!
//! Subscribes to the creation log (historical replay + live stream), keeps
//! one non-blocking timer per pending deal, and drives every deal to exactly
//! one release-or-refund decision. Restart safety comes from the replay: the
//! whole schedule is rebuilt from the log and each deal's current status, so
//! a decided deal is never re-decided and a pending one is never lost.
//!
//! All failure handling is local to one deal's task — a stuck oracle or a
//! rejected submission never disturbs the scheduling of other deals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use openescrow_types::{
    DealCreated, DealEvent, DealId, EscrowError, OracleFailurePolicy, Result, VerifierConfig,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::gateway::{CustodyGateway, DealBrief};
use crate::oracle::ProofOracle;
use crate::retry::Backoff;
use crate::scheduler::{DecisionOutcome, InFlight, PendingDecision};

/// The decision to submit once the oracle has spoken.
enum Decision {
    Release,
    Refund(String),
}

impl Decision {
    fn kind(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Refund(_) => "refund",
        }
    }
}

/// Off-chain orchestrator: exactly one decision per deal, crash-safe.
pub struct VerifierService {
    gateway: Arc<dyn CustodyGateway>,
    oracle: Arc<dyn ProofOracle>,
    config: VerifierConfig,
    inflight: InFlight,
    outcomes: Mutex<HashMap<DealId, DecisionOutcome>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl VerifierService {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn CustodyGateway>,
        oracle: Arc<dyn ProofOracle>,
        config: VerifierConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            oracle,
            config,
            inflight: InFlight::new(),
            outcomes: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Run until the event stream closes: replay the log, then consume live
    /// notifications. A lagged receiver resynchronizes from the log; the
    /// in-flight claim set absorbs the resulting duplicates.
    pub async fn run(self: Arc<Self>) {
        let (history, mut live) = self.gateway.subscribe();
        tracing::info!(
            replayed = history.len(),
            "Verifier service starting; replaying creation log"
        );
        for event in history {
            Self::observe(&self, event);
        }

        loop {
            match live.recv().await {
                Ok(event) => Self::observe(&self, event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged; resynchronizing from log");
                    let (history, rx) = self.gateway.subscribe();
                    live = rx;
                    for event in history {
                        Self::observe(&self, event);
                    }
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Event stream closed; verifier service stopping");
                    break;
                }
            }
        }
    }

    /// Abort every scheduled decision task (crash / shutdown simulation).
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    /// Recorded outcome for a deal this instance decided (or skipped).
    #[must_use]
    pub fn outcome(&self, deal_id: DealId) -> Option<DecisionOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&deal_id)
            .copied()
    }

    #[must_use]
    pub fn decided_count(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Spawn a decision task for a newly observed creation. Duplicates
    /// (replay overlap, resync, a second notification) lose the claim and
    /// are dropped here.
    fn observe(service: &Arc<Self>, event: DealEvent) {
        let DealEvent::Created(created) = event else {
            return;
        };
        if !service.inflight.claim(created.deal_id) {
            return;
        }

        let task_service = Arc::clone(service);
        let handle = tokio::spawn(async move {
            let deal_id = created.deal_id;
            let outcome = task_service.decide(created).await;
            task_service
                .outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(deal_id, outcome);
            tracing::info!(deal = %deal_id, outcome = %outcome, "Decision task finished");
        });
        service
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Drive one deal from notification to outcome.
    async fn decide(&self, created: DealCreated) -> DecisionOutcome {
        let deal_id = created.deal_id;

        let brief = match self.brief_with_retry(deal_id).await {
            Ok(brief) => brief,
            Err(err) => {
                tracing::error!(
                    deal = %deal_id,
                    error = %err,
                    "ALERT: cannot read deal state; decision abandoned"
                );
                return DecisionOutcome::Abandoned;
            }
        };
        if brief.status.is_decided() {
            tracing::debug!(deal = %deal_id, status = %brief.status, "Already decided; nothing to schedule");
            return DecisionOutcome::AlreadySettled;
        }

        let mut entry = PendingDecision::new(&created, brief.decision_due_at);
        let wait = entry.remaining_wait(Utc::now());
        tracing::info!(
            deal = %deal_id,
            identity = %entry.identity_ref,
            due_at = %entry.due_at,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "Decision scheduled"
        );
        tokio::time::sleep(wait).await;

        // The delay has elapsed; someone else may have decided meanwhile
        // (another instance, manual intervention). A decided deal is a
        // benign race, not an error.
        match self.brief_with_retry(deal_id).await {
            Ok(brief) if brief.status.is_decided() => {
                tracing::debug!(deal = %deal_id, status = %brief.status, "Decided while waiting; no-op");
                return DecisionOutcome::AlreadySettled;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(
                    deal = %deal_id,
                    error = %err,
                    "ALERT: cannot re-check deal state; decision abandoned"
                );
                return DecisionOutcome::Abandoned;
            }
        }

        match self.check_with_retry(&mut entry).await {
            Ok(true) => {
                tracing::info!(deal = %deal_id, identity = %entry.identity_ref, "Proof found; releasing");
                self.submit(deal_id, &Decision::Release).await
            }
            Ok(false) => {
                tracing::info!(deal = %deal_id, identity = %entry.identity_ref, "Proof not found; refunding");
                let reason = format!(
                    "verifier: no proof found for {} after delay",
                    entry.identity_ref
                );
                self.submit(deal_id, &Decision::Refund(reason)).await
            }
            Err(err) => match self.config.on_oracle_failure {
                OracleFailurePolicy::Refund => {
                    tracing::warn!(
                        deal = %deal_id,
                        attempts = entry.attempts,
                        error = %err,
                        "Oracle exhausted; taking fail-safe refund path"
                    );
                    let reason = format!(
                        "verifier: oracle unavailable after {} attempts",
                        entry.attempts
                    );
                    self.submit(deal_id, &Decision::Refund(reason)).await
                }
                OracleFailurePolicy::Hold => {
                    tracing::error!(
                        deal = %deal_id,
                        attempts = entry.attempts,
                        error = %err,
                        "ALERT: oracle unavailable and policy is HOLD; deal left ACTIVE"
                    );
                    DecisionOutcome::Abandoned
                }
            },
        }
    }

    /// Read the deal, retrying transient gateway failures.
    async fn brief_with_retry(&self, deal_id: DealId) -> Result<DealBrief> {
        let mut backoff = Backoff::new(self.config.retry.clone());
        loop {
            match self.gateway.brief(deal_id).await {
                Ok(brief) => return Ok(brief),
                Err(err @ EscrowError::GatewayUnavailable { .. }) => {
                    match backoff.next_delay() {
                        Some(delay) => {
                            tracing::warn!(deal = %deal_id, error = %err, "Deal read failed; backing off");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Query the oracle, retrying with bounded backoff.
    async fn check_with_retry(&self, entry: &mut PendingDecision) -> Result<bool> {
        let mut backoff = Backoff::new(self.config.retry.clone());
        loop {
            entry.attempts += 1;
            match self.oracle.check(&entry.identity_ref, &entry.nonce).await {
                Ok(verdict) => return Ok(verdict),
                Err(err) => match backoff.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            deal = %entry.deal_id,
                            attempt = entry.attempts,
                            error = %err,
                            "Oracle check failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    /// Submit the decision. Transient failures and clock skew retry; a
    /// state conflict means another actor already decided (no-op); anything
    /// else abandons with an operator alert.
    async fn submit(&self, deal_id: DealId, decision: &Decision) -> DecisionOutcome {
        let mut backoff = Backoff::new(self.config.retry.clone());
        loop {
            let result = match decision {
                Decision::Release => self.gateway.release(deal_id).await,
                Decision::Refund(reason) => self.gateway.refund(deal_id, reason).await,
            };
            let err = match result {
                Ok(()) => {
                    tracing::info!(deal = %deal_id, decision = decision.kind(), "Decision issued");
                    return match decision {
                        Decision::Release => DecisionOutcome::Released,
                        Decision::Refund(_) => DecisionOutcome::Refunded,
                    };
                }
                Err(err) => err,
            };

            match err {
                EscrowError::WrongStatus { actual, .. } => {
                    tracing::debug!(deal = %deal_id, status = %actual, "Lost decision race; no-op");
                    return DecisionOutcome::AlreadySettled;
                }
                err @ (EscrowError::GatewayUnavailable { .. }
                | EscrowError::VerificationDelayActive { .. }) => match backoff.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            deal = %deal_id,
                            decision = decision.kind(),
                            error = %err,
                            "Decision submission failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        let exhausted = EscrowError::DecisionRetriesExhausted {
                            deal_id,
                            attempts: backoff.attempts(),
                        };
                        tracing::error!(
                            deal = %deal_id,
                            error = %exhausted,
                            "ALERT: deal left ACTIVE without a decision"
                        );
                        return DecisionOutcome::Abandoned;
                    }
                },
                err => {
                    tracing::error!(
                        deal = %deal_id,
                        decision = decision.kind(),
                        error = %err,
                        "ALERT: decision rejected; deal left ACTIVE"
                    );
                    return DecisionOutcome::Abandoned;
                }
            }
        }
    }
}
