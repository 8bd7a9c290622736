//! # openescrow-custody
//!
//! **Custody Plane**: the treasury ledger, the per-deal custody state
//! machine, and the deal registry with its durable notification log.
//!
//! ## Architecture
//!
//! 1. **Treasury**: per-account available balances; the trivial value
//!    primitive (hold, credit, pay out)
//! 2. **Deal**: one custody entry's lifecycle — role-gated, time-gated
//!    release/refund and pull-payment withdrawal
//! 3. **DealRegistry**: factory — validates, funds, mints nonces, stores
//!    deals in an arena of independently-lockable entries
//! 4. **EventLog**: append-only, replayable notification log with a live
//!    broadcast channel
//!
//! ## Deal Flow
//!
//! ```text
//! Registry.create() → DealCreated → [verifier decides] → release()/refund()
//!     → withdrawable entitlement → withdraw() → Treasury payout → COMPLETED
//! ```
//!
//! Value custody per deal is isolated: a failure or delay in one deal's
//! decision never affects another's funds.

pub mod deal;
pub mod ledger;
pub mod log;
pub mod registry;

pub use deal::{Deal, Payable};
pub use ledger::{PayoutSink, Treasury};
pub use log::EventLog;
pub use registry::DealRegistry;
