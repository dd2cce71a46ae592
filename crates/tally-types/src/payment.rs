//! # Payments and deferred cashback
//!
//! Every successful `pay` registers a [`Payment`] and schedules a
//! [`PendingCashback`] that matures a fixed delay later.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────────┐  cashback matured   ┌───────────────────┐
//!   │ IN_PROGRESS ├────────────────────▶│ CASHBACK_RECEIVED │
//!   └─────────────┘                     └───────────────────┘
//! ```
//!
//! The transition happens at most once and only from the cashback sweep.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, LedgerError, PaymentId, Timestamp};

/// The lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Cashback scheduled but not yet credited.
    InProgress,
    /// Cashback credited to the owning account. Terminal.
    CashbackReceived,
}

impl PaymentStatus {
    /// Can a payment in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::InProgress, Self::CashbackReceived))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::CashbackReceived => write!(f, "CASHBACK_RECEIVED"),
        }
    }
}

/// A registered payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// The account that paid, as resolved at payment time. May since have
    /// been absorbed by a merge; ownership checks resolve it again.
    pub owner: AccountId,
    /// When the payment was made.
    pub timestamp: Timestamp,
    /// Principal debited from the owner.
    pub amount: Amount,
    /// Cashback scheduled for this payment.
    pub cashback: Amount,
    pub status: PaymentStatus,
}

impl Payment {
    /// Mark the cashback as received.
    ///
    /// # Errors
    /// Returns `InvalidStatusTransition` if the cashback was already received.
    pub fn mark_cashback_received(&mut self) -> crate::Result<()> {
        if !self.status.can_transition_to(PaymentStatus::CashbackReceived) {
            return Err(LedgerError::InvalidStatusTransition(self.id));
        }
        self.status = PaymentStatus::CashbackReceived;
        Ok(())
    }
}

/// A deferred cashback credit waiting for its maturity time.
///
/// Ordered by `(matures_at, payment_id)`: the scheduler drains earliest
/// maturity first and breaks ties by payment creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCashback {
    /// Logical time at which the credit becomes payable.
    pub matures_at: Timestamp,
    /// Account to credit (resolved again at maturity).
    pub beneficiary: AccountId,
    pub amount: Amount,
    /// The payment that produced this cashback.
    pub payment_id: PaymentId,
}

impl Ord for PendingCashback {
    fn cmp(&self, other: &Self) -> Ordering {
        self.matures_at
            .cmp(&other.matures_at)
            .then(self.payment_id.cmp(&other.payment_id))
            .then_with(|| self.beneficiary.cmp(&other.beneficiary))
            .then(self.amount.cmp(&other.amount))
    }
}

impl PartialOrd for PendingCashback {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
