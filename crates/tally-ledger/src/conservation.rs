//! Supply conservation invariant checker.
//!
//! Funds enter the ledger through deposits and cashback credits and leave
//! through payments. Transfers and merges only move funds around:
//! ```text
//! Σ balances       == deposits - payments + cashback_credited
//! Σ pending credit == cashback_scheduled - cashback_credited - cashback_dropped
//! ```
//!
//! A mismatch means a mutation path forgot to record itself or touched a
//! balance twice. It is an implementation defect, never a user error.

use tally_types::{Amount, LedgerError, Result};

/// Running totals of every fund-creating or fund-destroying event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SupplyConservation {
    deposits: u128,
    payments: u128,
    cashback_scheduled: u128,
    cashback_credited: u128,
    cashback_dropped: u128,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deposit(&mut self, amount: Amount) {
        self.deposits += u128::from(amount);
    }

    /// Record a payment's principal leaving the ledger and the cashback it
    /// schedules.
    pub fn record_payment(&mut self, amount: Amount, cashback: Amount) {
        self.payments += u128::from(amount);
        self.cashback_scheduled += u128::from(cashback);
    }

    pub fn record_cashback_credited(&mut self, amount: Amount) {
        self.cashback_credited += u128::from(amount);
    }

    pub fn record_cashback_dropped(&mut self, amount: Amount) {
        self.cashback_dropped += u128::from(amount);
    }

    /// Expected sum of all canonical balances.
    #[must_use]
    pub fn expected_balances(&self) -> u128 {
        // Never negative: every payment was covered by a balance.
        self.deposits + self.cashback_credited - self.payments
    }

    /// Expected sum of all still-pending cashback.
    #[must_use]
    pub fn expected_pending(&self) -> u128 {
        self.cashback_scheduled - self.cashback_credited - self.cashback_dropped
    }

    /// Compare observed totals with the expected ones.
    ///
    /// # Errors
    /// Returns [`LedgerError::SupplyInvariantViolation`] on any mismatch.
    pub fn verify(&self, actual_balances: u128, actual_pending: u128) -> Result<()> {
        let expected = self.expected_balances();
        if actual_balances != expected {
            return Err(LedgerError::SupplyInvariantViolation {
                reason: format!(
                    "balances {actual_balances} != expected {expected} \
                     (deposits={}, payments={}, cashback_credited={})",
                    self.deposits, self.payments, self.cashback_credited
                ),
            });
        }
        let expected = self.expected_pending();
        if actual_pending != expected {
            return Err(LedgerError::SupplyInvariantViolation {
                reason: format!(
                    "pending cashback {actual_pending} != expected {expected} \
                     (scheduled={}, credited={}, dropped={})",
                    self.cashback_scheduled, self.cashback_credited, self.cashback_dropped
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_deposits(&self) -> u128 {
        self.deposits
    }

    #[must_use]
    pub fn total_payments(&self) -> u128 {
        self.payments
    }

    #[must_use]
    pub fn total_cashback_credited(&self) -> u128 {
        self.cashback_credited
    }

    #[must_use]
    pub fn total_cashback_dropped(&self) -> u128 {
        self.cashback_dropped
    }
}
