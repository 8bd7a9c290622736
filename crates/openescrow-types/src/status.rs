//! Deal lifecycle states.
//!
//! ```text
//!              ┌──────────┐  withdraw   ┌───────────┐
//!        ┌────▶│ RELEASED ├────────────▶│           │
//!   ┌────┴───┐ └──────────┘             │ COMPLETED │
//!   │ ACTIVE │                          │           │
//!   └────┬───┘ ┌──────────┐  withdraw   │           │
//!        └────▶│ REFUNDED ├────────────▶│           │
//!              └──────────┘             └───────────┘
//! ```
//!
//! Transitions are **monotonic** (never go backwards). `Released` and
//! `Refunded` are mutually exclusive: exactly one decision per deal.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    /// Custody is held; the verification decision is pending.
    Active,
    /// The verifier decided in the beneficiary's favor; the beneficiary
    /// holds the withdrawable entitlement.
    Released,
    /// The verifier decided against the beneficiary; the founder holds the
    /// withdrawable entitlement.
    Refunded,
    /// The entitlement was paid out; the deal persists as an audit record.
    /// **Irreversible.**
    Completed,
}

impl DealStatus {
    /// Can this status transition to the given target status?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Released | Self::Refunded)
                | (Self::Released | Self::Refunded, Self::Completed)
        )
    }

    /// Whether a release/refund decision has already been issued.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether the deal has reached its final state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_valid() {
        assert!(DealStatus::Active.can_transition_to(DealStatus::Released));
        assert!(DealStatus::Active.can_transition_to(DealStatus::Refunded));
        assert!(DealStatus::Released.can_transition_to(DealStatus::Completed));
        assert!(DealStatus::Refunded.can_transition_to(DealStatus::Completed));
    }

    #[test]
    fn transitions_invalid() {
        assert!(!DealStatus::Active.can_transition_to(DealStatus::Completed));
        assert!(!DealStatus::Released.can_transition_to(DealStatus::Refunded));
        assert!(!DealStatus::Refunded.can_transition_to(DealStatus::Released));
        assert!(!DealStatus::Released.can_transition_to(DealStatus::Active));
        assert!(!DealStatus::Completed.can_transition_to(DealStatus::Active));
        assert!(!DealStatus::Completed.can_transition_to(DealStatus::Released));
        assert!(!DealStatus::Completed.can_transition_to(DealStatus::Refunded));
    }

    #[test]
    fn decided_and_terminal() {
        assert!(!DealStatus::Active.is_decided());
        assert!(DealStatus::Released.is_decided());
        assert!(DealStatus::Refunded.is_decided());
        assert!(DealStatus::Completed.is_decided());

        assert!(!DealStatus::Released.is_terminal());
        assert!(DealStatus::Completed.is_terminal());
    }

    #[test]
    fn display_screaming_case() {
        assert_eq!(DealStatus::Active.to_string(), "ACTIVE");
        assert_eq!(DealStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn serde_roundtrip() {
        let status = DealStatus::Refunded;
        let json = serde_json::to_string(&status).unwrap();
        let back: DealStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}
