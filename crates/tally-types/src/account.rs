//! Account-facing value types: balance snapshots and history entries.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Timestamp};

/// A point-in-time balance record for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Logical time of the change.
    pub timestamp: Timestamp,
    /// Balance right after the change.
    pub balance: Amount,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(timestamp: Timestamp, balance: Amount) -> Self {
        Self { timestamp, balance }
    }
}

/// Read-only view of a canonical account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    /// Current balance.
    pub balance: Amount,
    /// Cumulative outgoing total (transfers sent plus payments made).
    pub outgoing: Amount,
}
