//! Account balances and outgoing totals.
//!
//! Tracks every canonical account's current balance and cumulative
//! outgoing total. All mutations are atomic: every check runs before the
//! first write, so a failed operation leaves the book unchanged.
//!
//! The book knows nothing about merge redirects; callers pass canonical
//! ids.

use std::collections::HashMap;

use tally_types::{AccountId, AccountSnapshot, Amount, LedgerError, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct AccountState {
    balance: Amount,
    outgoing: Amount,
}

/// Canonical accounts with their balance and outgoing total.
#[derive(Debug, Default, Clone)]
pub struct AccountBook {
    accounts: HashMap<AccountId, AccountState>,
}

impl AccountBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Open a zero-balance account.
    ///
    /// # Errors
    /// Returns `AccountExists` if the id is already present.
    pub fn open(&mut self, id: &AccountId) -> Result<()> {
        if self.accounts.contains_key(id) {
            return Err(LedgerError::AccountExists(id.clone()));
        }
        self.accounts.insert(id.clone(), AccountState::default());
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    /// Current balance, or `None` if the account does not exist.
    #[must_use]
    pub fn balance(&self, id: &AccountId) -> Option<Amount> {
        self.accounts.get(id).map(|s| s.balance)
    }

    /// Cumulative outgoing total, or `None` if the account does not exist.
    #[must_use]
    pub fn outgoing(&self, id: &AccountId) -> Option<Amount> {
        self.accounts.get(id).map(|s| s.outgoing)
    }

    /// Credit `amount` and return the new balance.
    ///
    /// # Errors
    /// `AccountNotFound` or `BalanceOverflow`.
    pub fn credit(&mut self, id: &AccountId, amount: Amount) -> Result<Amount> {
        let state = self.state_mut(id)?;
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(id.clone()))?;
        Ok(state.balance)
    }

    /// Debit `amount` as spending: the balance drops and the outgoing total
    /// grows by the same amount. Returns the new balance.
    ///
    /// # Errors
    /// `AccountNotFound` or `InsufficientBalance`.
    pub fn spend(&mut self, id: &AccountId, amount: Amount) -> Result<Amount> {
        let state = self.state_mut(id)?;
        if state.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available: state.balance,
            });
        }
        // Outgoing is a ranking statistic; it saturates instead of failing.
        let outgoing = state.outgoing.saturating_add(amount);
        state.balance -= amount;
        state.outgoing = outgoing;
        Ok(state.balance)
    }

    /// Move `amount` from `source` to `target`, counting it as spending by
    /// `source`. Returns `(source_balance, target_balance)`.
    ///
    /// # Errors
    /// `SelfTransfer`, `AccountNotFound`, `InsufficientBalance`, or
    /// `BalanceOverflow` on the target.
    pub fn transfer(
        &mut self,
        source: &AccountId,
        target: &AccountId,
        amount: Amount,
    ) -> Result<(Amount, Amount)> {
        if source == target {
            return Err(LedgerError::SelfTransfer(source.clone()));
        }
        let src = self.state(source)?;
        let dst = self.state(target)?;
        if src.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available: src.balance,
            });
        }
        let target_balance = dst
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(target.clone()))?;

        let source_balance = self.spend(source, amount)?;
        self.state_mut(target)?.balance = target_balance;
        Ok((source_balance, target_balance))
    }

    /// Fold `absorbed` into `survivor`: balances and outgoing totals are
    /// summed and `absorbed` disappears. Returns the survivor's new balance.
    ///
    /// # Errors
    /// `SelfMerge`, `AccountNotFound`, or `BalanceOverflow`.
    pub fn absorb(&mut self, survivor: &AccountId, absorbed: &AccountId) -> Result<Amount> {
        if survivor == absorbed {
            return Err(LedgerError::SelfMerge(survivor.clone()));
        }
        let keep = self.state(survivor)?;
        let gone = self.state(absorbed)?;
        let balance = keep
            .balance
            .checked_add(gone.balance)
            .ok_or_else(|| LedgerError::BalanceOverflow(survivor.clone()))?;
        let outgoing = keep.outgoing.saturating_add(gone.outgoing);

        self.accounts.remove(absorbed);
        *self.state_mut(survivor)? = AccountState { balance, outgoing };
        Ok(balance)
    }

    /// Snapshot of one account.
    #[must_use]
    pub fn snapshot(&self, id: &AccountId) -> Option<AccountSnapshot> {
        self.accounts.get(id).map(|s| AccountSnapshot {
            id: id.clone(),
            balance: s.balance,
            outgoing: s.outgoing,
        })
    }

    /// Snapshots of every account, sorted by id.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let mut out: Vec<_> = self
            .accounts
            .iter()
            .map(|(id, s)| AccountSnapshot {
                id: id.clone(),
                balance: s.balance,
                outgoing: s.outgoing,
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// `(id, outgoing)` for every account, in no particular order.
    pub fn outgoing_totals(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.accounts.iter().map(|(id, s)| (id, s.outgoing))
    }

    /// Sum of all balances. Widened so it cannot overflow.
    #[must_use]
    pub fn total_balance(&self) -> u128 {
        self.accounts.values().map(|s| u128::from(s.balance)).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn state(&self, id: &AccountId) -> Result<AccountState> {
        self.accounts
            .get(id)
            .copied()
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))
    }

    fn state_mut(&mut self, id: &AccountId) -> Result<&mut AccountState> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::from(s)
    }

    fn book_with(accounts: &[(&str, Amount)]) -> AccountBook {
        let mut book = AccountBook::new();
        for (name, balance) in accounts {
            book.open(&id(name)).unwrap();
            if *balance > 0 {
                book.credit(&id(name), *balance).unwrap();
            }
        }
        book
    }

    #[test]
    fn open_twice_fails() {
        let mut book = AccountBook::new();
        book.open(&id("a")).unwrap();
        assert_eq!(book.open(&id("a")), Err(LedgerError::AccountExists(id("a"))));
        assert_eq!(book.balance(&id("a")), Some(0));
    }

    #[test]
    fn credit_missing_account_fails() {
        let mut book = AccountBook::new();
        assert_eq!(
            book.credit(&id("x"), 5),
            Err(LedgerError::AccountNotFound(id("x")))
        );
    }

    #[test]
    fn credit_overflow_leaves_balance() {
        let mut book = book_with(&[("a", u64::MAX)]);
        assert!(matches!(
            book.credit(&id("a"), 1),
            Err(LedgerError::BalanceOverflow(_))
        ));
        assert_eq!(book.balance(&id("a")), Some(u64::MAX));
    }

    #[test]
    fn spend_tracks_outgoing() {
        let mut book = book_with(&[("a", 100)]);
        assert_eq!(book.spend(&id("a"), 30).unwrap(), 70);
        assert_eq!(book.outgoing(&id("a")), Some(30));
    }

    #[test]
    fn spend_insufficient_is_atomic() {
        let mut book = book_with(&[("a", 10)]);
        let err = book.spend(&id("a"), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                needed: 11,
                available: 10
            }
        );
        assert_eq!(book.balance(&id("a")), Some(10));
        assert_eq!(book.outgoing(&id("a")), Some(0));
    }

    #[test]
    fn transfer_moves_funds() {
        let mut book = book_with(&[("a", 100), ("b", 5)]);
        assert_eq!(book.transfer(&id("a"), &id("b"), 40).unwrap(), (60, 45));
        assert_eq!(book.outgoing(&id("a")), Some(40));
        assert_eq!(book.outgoing(&id("b")), Some(0));
        assert_eq!(book.total_balance(), 105);
    }

    #[test]
    fn transfer_failures_change_nothing() {
        let mut book = book_with(&[("a", 100), ("b", u64::MAX)]);
        assert!(matches!(
            book.transfer(&id("a"), &id("a"), 1),
            Err(LedgerError::SelfTransfer(_))
        ));
        assert!(matches!(
            book.transfer(&id("a"), &id("zz"), 1),
            Err(LedgerError::AccountNotFound(_))
        ));
        assert!(matches!(
            book.transfer(&id("a"), &id("b"), 1),
            Err(LedgerError::BalanceOverflow(_))
        ));
        assert_eq!(book.balance(&id("a")), Some(100));
        assert_eq!(book.outgoing(&id("a")), Some(0));
    }

    #[test]
    fn absorb_sums_and_removes() {
        let mut book = book_with(&[("a", 100), ("b", 50)]);
        book.spend(&id("a"), 10).unwrap();
        book.spend(&id("b"), 20).unwrap();

        assert_eq!(book.absorb(&id("a"), &id("b")).unwrap(), 120);
        assert!(!book.contains(&id("b")));
        assert_eq!(book.outgoing(&id("a")), Some(30));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn snapshots_sorted_by_id() {
        let book = book_with(&[("c", 1), ("a", 2), ("b", 3)]);
        let ids: Vec<_> = book.snapshots().into_iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
