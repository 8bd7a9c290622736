//! Configuration types for the custody registry and the verifier service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the custody registry (factory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyConfig {
    /// Waiting period after creation before a decision may be issued.
    pub verification_delay: Duration,
    /// Creation-time party validation policy.
    pub policy: CreationPolicy,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            verification_delay: Duration::from_secs(constants::DEFAULT_VERIFICATION_DELAY_SECS),
            policy: CreationPolicy::default(),
        }
    }
}

/// Party validation policy applied at deal creation.
///
/// Nil-account and positive-amount checks are unconditional; the
/// self-dealing check is policy because the three roles are only required
/// to be distinct in practice, not by the custody model itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationPolicy {
    /// Reject deals where the beneficiary equals the founder or the verifier.
    pub forbid_self_dealing: bool,
}

impl Default for CreationPolicy {
    fn default() -> Self {
        Self {
            forbid_self_dealing: true,
        }
    }
}

/// Configuration for the verifier orchestrator service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Backoff policy for oracle checks and decision submission.
    pub retry: RetryConfig,
    /// What to do when the oracle cannot produce a verdict after retries.
    pub on_oracle_failure: OracleFailurePolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            on_oracle_failure: OracleFailurePolicy::Refund,
        }
    }
}

/// Bounded exponential backoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(constants::DEFAULT_RETRY_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(constants::DEFAULT_RETRY_MAX_BACKOFF_MS),
        }
    }
}

/// Fail-safe path when the oracle stays unavailable or ambiguous.
///
/// The default protects the founder: an undecidable deal is refunded rather
/// than left hanging. `Hold` keeps the deal ACTIVE for manual intervention
/// and raises an operator alert — never a silent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleFailurePolicy {
    /// Refund the founder with an explanatory reason.
    Refund,
    /// Leave the deal ACTIVE and alert the operator.
    Hold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custody_defaults() {
        let cfg = CustodyConfig::default();
        assert_eq!(cfg.verification_delay, Duration::from_secs(7200));
        assert!(cfg.policy.forbid_self_dealing);
    }

    #[test]
    fn verifier_defaults() {
        let cfg = VerifierConfig::default();
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.initial_backoff, Duration::from_millis(200));
        assert_eq!(cfg.retry.max_backoff, Duration::from_millis(30_000));
        assert_eq!(cfg.on_oracle_failure, OracleFailurePolicy::Refund);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = VerifierConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: VerifierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.retry.max_attempts, cfg.retry.max_attempts);
        assert_eq!(back.on_oracle_failure, cfg.on_oracle_failure);
    }
}
