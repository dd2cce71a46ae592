//! Payment registry.
//!
//! Allocates sequential payment ids and stores each payment's owner,
//! amount, and status. Ownership is recorded as the owner id at payment
//! time; the ledger resolves it through merges when checking access.

use std::collections::BTreeMap;

use tally_types::{
    AccountId, Amount, LedgerError, Payment, PaymentId, PaymentStatus, Result, Timestamp,
};

/// All payments made on a ledger, keyed by id.
#[derive(Debug, Clone)]
pub struct PaymentRegistry {
    payments: BTreeMap<PaymentId, Payment>,
    /// Last allocated id; `PaymentId(0)` before the first payment.
    last_id: PaymentId,
}

impl PaymentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            payments: BTreeMap::new(),
            last_id: PaymentId(0),
        }
    }

    /// Register a new IN_PROGRESS payment and return its id.
    pub fn register(
        &mut self,
        owner: AccountId,
        timestamp: Timestamp,
        amount: Amount,
        cashback: Amount,
    ) -> PaymentId {
        let id = self.last_id.next();
        self.last_id = id;
        self.payments.insert(
            id,
            Payment {
                id,
                owner,
                timestamp,
                amount,
                cashback,
                status: PaymentStatus::InProgress,
            },
        );
        id
    }

    /// Look up a payment.
    #[must_use]
    pub fn get(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id)
    }

    /// Flip a payment to CASHBACK_RECEIVED.
    ///
    /// # Errors
    /// `PaymentNotFound`, or `InvalidStatusTransition` if already received.
    pub fn mark_cashback_received(&mut self, id: PaymentId) -> Result<()> {
        self.payments
            .get_mut(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?
            .mark_cashback_received()
    }

    /// The most recently allocated id, if any payment was made.
    #[must_use]
    pub fn last_id(&self) -> Option<PaymentId> {
        (self.last_id.0 > 0).then_some(self.last_id)
    }

    /// All payments in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    /// Sum of all payment principal.
    #[must_use]
    pub fn total_principal(&self) -> u128 {
        self.payments.values().map(|p| u128::from(p.amount)).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl Default for PaymentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
