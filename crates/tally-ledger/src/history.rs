//! Per-account balance history.
//!
//! Each canonical account owns a list of [`HistoryEntry`] values sorted by
//! timestamp. Entries with equal timestamps keep insertion order, so the
//! last entry at a given time is the most recent balance at that time.
//! A merge interleaves two histories, and there equal timestamps are
//! ordered by balance instead.
//!
//! Inserts go to their sorted position rather than the end. Callers are
//! expected to move time forward, but a late call cannot break ordering.

use std::collections::HashMap;

use tally_types::{AccountId, Amount, HistoryEntry, LedgerError, Result, Timestamp};

/// Chronological balance snapshots for every canonical account.
#[derive(Debug, Default, Clone)]
pub struct HistoryLedger {
    histories: HashMap<AccountId, Vec<HistoryEntry>>,
}

impl HistoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
        }
    }

    /// Append a snapshot for `account` at `timestamp`, after any entry with
    /// the same or an earlier timestamp.
    pub fn record(&mut self, account: &AccountId, timestamp: Timestamp, balance: Amount) {
        let entries = self.histories.entry(account.clone()).or_default();
        let pos = entries.partition_point(|e| e.timestamp <= timestamp);
        entries.insert(pos, HistoryEntry::new(timestamp, balance));
    }

    /// Balance of `account` as of `at`: the latest entry with
    /// `timestamp <= at`.
    ///
    /// Returns `Ok(None)` when `at` precedes the first entry.
    ///
    /// # Errors
    /// Returns `AccountNotFound` if the account has no history.
    pub fn balance_at(&self, account: &AccountId, at: Timestamp) -> Result<Option<Amount>> {
        let entries = self
            .histories
            .get(account)
            .ok_or_else(|| LedgerError::AccountNotFound(account.clone()))?;
        let pos = entries.partition_point(|e| e.timestamp <= at);
        Ok(pos.checked_sub(1).map(|i| entries[i].balance))
    }

    /// Move `absorbed`'s history under `survivor`. The combined list is
    /// ordered by timestamp, then balance, so at a timestamp both accounts
    /// recorded the higher balance is the one `balance_at` sees.
    pub fn absorb(&mut self, survivor: &AccountId, absorbed: &AccountId) {
        let Some(theirs) = self.histories.remove(absorbed) else {
            return;
        };
        let merged = self.histories.entry(survivor.clone()).or_default();
        merged.extend(theirs);
        merged.sort_by_key(|e| (e.timestamp, e.balance));
    }

    /// Entries for `account`, oldest first.
    #[must_use]
    pub fn entries(&self, account: &AccountId) -> Option<&[HistoryEntry]> {
        self.histories.get(account).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, account: &AccountId) -> bool {
        self.histories.contains_key(account)
    }

    /// Account ids with a history, sorted.
    #[must_use]
    pub fn accounts(&self) -> Vec<&AccountId> {
        let mut ids: Vec<_> = self.histories.keys().collect();
        ids.sort();
        ids
    }

    /// Check that every history is sorted by timestamp.
    ///
    /// # Errors
    /// Returns `HistoryOutOfOrder` with the first offending entry.
    pub fn verify(&self) -> Result<()> {
        for (account, entries) in &self.histories {
            if let Some(pair) = entries.windows(2).find(|w| w[0].timestamp > w[1].timestamp) {
                return Err(LedgerError::HistoryOutOfOrder {
                    account: account.clone(),
                    timestamp: pair[1].timestamp,
                });
            }
        }
        Ok(())
    }
}
