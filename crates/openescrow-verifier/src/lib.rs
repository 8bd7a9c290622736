//! # openescrow-verifier
//!
//! **Verifier Plane**: the off-chain orchestrator that turns deal creations
//! into exactly one release-or-refund decision each.
//!
//! ## Architecture
//!
//! 1. **CustodyGateway**: the boundary to the Custody Plane — event
//!    subscription, deal reads, and decision submission under the
//!    verifier's credential
//! 2. **ProofOracle**: the black-box external condition check, keyed by
//!    `(identity_ref, nonce)`
//! 3. **Backoff**: bounded exponential retry policy
//! 4. **VerifierService**: replays the creation log, schedules one timer
//!    per pending deal, and drives each decision to a recorded outcome
//!
//! ## Decision Flow
//!
//! ```text
//! DealCreated ──▶ claim ──▶ sleep until due ──▶ status re-check
//!     └─ replayed on restart          └─ not ACTIVE? benign no-op
//!                ──▶ oracle check (retry/backoff)
//!                ──▶ release() / refund() (retry; WrongStatus = no-op)
//! ```
//!
//! A deal is never left ACTIVE silently: oracle exhaustion takes the
//! configured fail-safe path, and an undeliverable decision raises an
//! operator alert.

pub mod gateway;
pub mod oracle;
pub mod retry;
pub mod scheduler;
pub mod service;

pub use gateway::{CustodyGateway, DealBrief, LocalGateway};
pub use oracle::{ProofOracle, StaticOracle, UnavailableOracle};
pub use retry::Backoff;
pub use scheduler::{DecisionOutcome, InFlight, PendingDecision};
pub use service::VerifierService;
