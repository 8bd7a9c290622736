//! # openescrow-types
//!
//! Shared types, errors, and configuration for the **OpenEscrow** custody engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`DealId`], [`AccountId`], [`Nonce`]
//! - **Deal lifecycle**: [`DealStatus`]
//! - **Notifications**: [`DealEvent`], [`DealCreated`]
//! - **Configuration**: [`CustodyConfig`], [`CreationPolicy`], [`VerifierConfig`], [`RetryConfig`]
//! - **Errors**: [`EscrowError`] with `OE_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod status;

// Re-export all primary types at crate root for ergonomic imports:
//   use openescrow_types::{DealId, DealStatus, DealEvent, ...};

pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use status::*;

// Constants are accessed via `openescrow_types::constants::FOO`
// (not re-exported to avoid name collisions).
