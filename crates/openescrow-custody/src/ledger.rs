//! Treasury — the minimal value-custody primitive.
//!
//! Tracks each account's available balance. Deal creation debits the
//! founder; withdrawal credits the entitled party through the [`PayoutSink`]
//! seam. Funds held inside deals live on the deals themselves, so the sum of
//! treasury balances plus deal holdings is constant across a deal lifecycle.

use std::collections::HashMap;

use openescrow_types::{AccountId, EscrowError, Result};
use rust_decimal::Decimal;

/// The external value-transfer seam used by deal withdrawal.
///
/// Withdrawal clears the entitlement *before* calling `transfer`; an `Err`
/// here makes the deal restore the entitlement, so implementations must not
/// leave a partial credit behind on failure.
pub trait PayoutSink {
    fn transfer(&mut self, to: AccountId, amount: Decimal) -> Result<()>;
}

/// Per-account available balances.
#[derive(Debug, Default)]
pub struct Treasury {
    balances: HashMap<AccountId, Decimal>,
}

impl Treasury {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add external funds to an account.
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) {
        *self.balances.entry(account).or_insert(Decimal::ZERO) += amount;
    }

    /// Remove funds from an account (deal funding).
    ///
    /// # Errors
    /// Returns [`EscrowError::InsufficientFunds`] if the account does not
    /// cover `amount`; the balance is untouched on failure.
    pub fn debit(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        let balance = self.balances.entry(account).or_insert(Decimal::ZERO);
        if *balance < amount {
            return Err(EscrowError::InsufficientFunds {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    /// Return funds to an account (payout).
    pub fn credit(&mut self, account: AccountId, amount: Decimal) {
        *self.balances.entry(account).or_insert(Decimal::ZERO) += amount;
    }

    /// Current available balance for an account.
    #[must_use]
    pub fn balance(&self, account: AccountId) -> Decimal {
        self.balances.get(&account).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of all available balances (conservation checks).
    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.balances.values().copied().sum()
    }
}

impl PayoutSink for Treasury {
    fn transfer(&mut self, to: AccountId, amount: Decimal) -> Result<()> {
        self.credit(to, amount);
        Ok(())
    }
}
