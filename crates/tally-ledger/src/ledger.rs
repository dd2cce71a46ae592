//! The ledger engine.
//!
//! [`Ledger`] owns every component and routes each operation through the
//! same steps:
//!
//! ```text
//! cashback sweep(timestamp) → resolve ids → validate → mutate → record history
//! ```
//!
//! The sweep runs first so that a credit maturing exactly at the call's
//! timestamp is visible to that call. Validation finishes before the first
//! write, so a failed call leaves no trace.

use tally_types::{
    AccountId, AccountSnapshot, Amount, HistoryEntry, LedgerConfig, LedgerError, Payment,
    PaymentId, PaymentStatus, Result, Timestamp,
};

use crate::{
    accounts::AccountBook, cashback::CashbackScheduler, conservation::SupplyConservation,
    history::HistoryLedger, identity::IdentityResolver, payments::PaymentRegistry,
    ranking::SpenderRank,
};

/// A single in-memory ledger instance.
///
/// Operations take `&mut self` and run to completion; embedders that share
/// a ledger across threads serialize access with one lock.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) identity: IdentityResolver,
    pub(crate) accounts: AccountBook,
    pub(crate) history: HistoryLedger,
    pub(crate) payments: PaymentRegistry,
    pub(crate) cashback: CashbackScheduler,
    pub(crate) supply: SupplyConservation,
}

impl Ledger {
    /// Create an empty ledger with the default cashback program.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(LedgerConfig::default())
    }

    /// Create an empty ledger with a custom cashback program.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid.
    pub fn with_config(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: LedgerConfig) -> Self {
        Self {
            config,
            identity: IdentityResolver::new(),
            accounts: AccountBook::new(),
            history: HistoryLedger::new(),
            payments: PaymentRegistry::new(),
            cashback: CashbackScheduler::new(),
            supply: SupplyConservation::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =================================================================
    // Operations
    // =================================================================

    /// Open a zero-balance account and record its first history entry.
    ///
    /// # Errors
    /// `AccountExists` if `id` resolves to a live account, including an id
    /// absorbed by a merge.
    pub fn create_account(&mut self, timestamp: Timestamp, id: &AccountId) -> Result<()> {
        let id = self.identity.resolve(id);
        self.accounts.open(&id)?;
        self.history.record(&id, timestamp, 0);

        tracing::debug!(account = %id, timestamp, "Account created");
        Ok(())
    }

    /// Add `amount` to an account. Returns the new balance.
    ///
    /// # Errors
    /// `InvalidAmount`, `AccountNotFound`, or `BalanceOverflow`.
    pub fn deposit(&mut self, timestamp: Timestamp, id: &AccountId, amount: Amount) -> Result<Amount> {
        self.sweep_cashback(timestamp);
        let id = self.identity.resolve(id);
        ensure_positive(amount)?;

        let balance = self.accounts.credit(&id, amount)?;
        self.history.record(&id, timestamp, balance);
        self.supply.record_deposit(amount);

        tracing::debug!(account = %id, amount, balance, timestamp, "Deposit");
        Ok(balance)
    }

    /// Move `amount` between two accounts. Returns the source's new balance.
    ///
    /// # Errors
    /// `InvalidAmount`, `SelfTransfer`, `AccountNotFound`,
    /// `InsufficientBalance`, or `BalanceOverflow`.
    pub fn transfer(
        &mut self,
        timestamp: Timestamp,
        source: &AccountId,
        target: &AccountId,
        amount: Amount,
    ) -> Result<Amount> {
        self.sweep_cashback(timestamp);
        let source = self.identity.resolve(source);
        let target = self.identity.resolve(target);
        ensure_positive(amount)?;

        let (source_balance, target_balance) = self.accounts.transfer(&source, &target, amount)?;
        self.history.record(&source, timestamp, source_balance);
        self.history.record(&target, timestamp, target_balance);

        tracing::debug!(
            source = %source,
            target = %target,
            amount,
            source_balance,
            timestamp,
            "Transfer"
        );
        Ok(source_balance)
    }

    /// Pay `amount` out of an account and schedule its cashback.
    ///
    /// The cashback (`cashback_rate_bps` of `amount`, rounded down) is
    /// credited back to the payer `cashback_delay_ms` later.
    ///
    /// # Errors
    /// `InvalidAmount`, `AccountNotFound`, or `InsufficientBalance`.
    pub fn pay(&mut self, timestamp: Timestamp, id: &AccountId, amount: Amount) -> Result<PaymentId> {
        self.sweep_cashback(timestamp);
        let id = self.identity.resolve(id);
        ensure_positive(amount)?;

        let balance = self.accounts.spend(&id, amount)?;
        self.history.record(&id, timestamp, balance);

        let cashback = self.config.cashback_for(amount);
        let matures_at = timestamp.saturating_add(self.config.cashback_delay_ms);
        let payment_id = self.payments.register(id.clone(), timestamp, amount, cashback);
        self.cashback.schedule(matures_at, id.clone(), cashback, payment_id);
        self.supply.record_payment(amount, cashback);

        tracing::debug!(
            account = %id,
            payment = %payment_id,
            amount,
            cashback,
            matures_at,
            balance,
            "Payment registered"
        );
        Ok(payment_id)
    }

    /// Status of a payment, visible only through the account that owns it
    /// now (the original payer or whoever absorbed it).
    ///
    /// # Errors
    /// `AccountNotFound`, `PaymentNotFound`, or `PaymentNotOwned`.
    pub fn payment_status(
        &mut self,
        timestamp: Timestamp,
        id: &AccountId,
        payment_id: PaymentId,
    ) -> Result<PaymentStatus> {
        self.sweep_cashback(timestamp);
        let id = self.identity.resolve(id);
        if !self.accounts.contains(&id) {
            return Err(LedgerError::AccountNotFound(id));
        }

        let (owner, status) = {
            let payment = self
                .payments
                .get(payment_id)
                .ok_or(LedgerError::PaymentNotFound(payment_id))?;
            (payment.owner.clone(), payment.status)
        };
        if self.identity.resolve(&owner) != id {
            return Err(LedgerError::PaymentNotOwned {
                payment: payment_id,
                account: id,
            });
        }
        Ok(status)
    }

    /// The `n` canonical accounts with the highest outgoing totals.
    pub fn top_spenders(&mut self, timestamp: Timestamp, n: usize) -> Vec<SpenderRank> {
        self.sweep_cashback(timestamp);
        crate::ranking::top_spenders(self.accounts.outgoing_totals(), n)
    }

    /// Fold `absorbed` into `survivor`.
    ///
    /// The survivor takes the absorbed account's balance, outgoing total,
    /// and history; the absorbed id redirects to the survivor from now on,
    /// so its payments stay reachable through the survivor.
    ///
    /// # Errors
    /// `SelfMerge`, `AccountNotFound`, or `BalanceOverflow`.
    pub fn merge_accounts(
        &mut self,
        timestamp: Timestamp,
        survivor: &AccountId,
        absorbed: &AccountId,
    ) -> Result<()> {
        self.sweep_cashback(timestamp);
        let survivor = self.identity.resolve(survivor);
        let absorbed = self.identity.resolve(absorbed);

        // The only fallible step; nothing is written unless it succeeds.
        let balance = self.accounts.absorb(&survivor, &absorbed)?;
        self.history.absorb(&survivor, &absorbed);
        self.history.record(&survivor, timestamp, balance);
        self.identity.absorb(absorbed.clone(), survivor.clone());

        tracing::info!(
            survivor = %survivor,
            absorbed = %absorbed,
            balance,
            timestamp,
            "Accounts merged"
        );
        Ok(())
    }

    /// Balance of an account as of `at`.
    ///
    /// Returns `Ok(None)` when `at` precedes the account's first history
    /// entry.
    ///
    /// # Errors
    /// `AccountNotFound` if the id resolves to no account history.
    pub fn balance_at(
        &mut self,
        timestamp: Timestamp,
        id: &AccountId,
        at: Timestamp,
    ) -> Result<Option<Amount>> {
        self.sweep_cashback(timestamp);
        let id = self.identity.resolve(id);
        self.history.balance_at(&id, at)
    }

    // =================================================================
    // Cashback sweep
    // =================================================================

    /// Apply every cashback credit that has matured by `now`.
    ///
    /// Each credit is recorded in history at its maturity time, not at
    /// `now`. A credit whose beneficiary no longer resolves to a live
    /// account is dropped. Calling this again with the same `now` does
    /// nothing.
    pub fn sweep_cashback(&mut self, now: Timestamp) {
        for item in self.cashback.drain_due(now) {
            let beneficiary = self.identity.resolve(&item.beneficiary);
            let balance = match self.accounts.credit(&beneficiary, item.amount) {
                Ok(balance) => balance,
                Err(err) => {
                    tracing::warn!(
                        payment = %item.payment_id,
                        beneficiary = %beneficiary,
                        amount = item.amount,
                        error = %err,
                        "Cashback dropped"
                    );
                    self.supply.record_cashback_dropped(item.amount);
                    continue;
                }
            };
            self.history.record(&beneficiary, item.matures_at, balance);
            self.supply.record_cashback_credited(item.amount);

            if let Err(err) = self.payments.mark_cashback_received(item.payment_id) {
                tracing::warn!(payment = %item.payment_id, error = %err, "Payment status not updated");
            }

            tracing::info!(
                payment = %item.payment_id,
                beneficiary = %beneficiary,
                amount = item.amount,
                matures_at = item.matures_at,
                balance,
                "Cashback credited"
            );
        }
    }

    // =================================================================
    // Read-only views
    // =================================================================

    /// Canonical id `id` resolves to, without compressing the merge chain.
    #[must_use]
    pub fn canonical_id(&self, id: &AccountId) -> AccountId {
        self.identity.canonical(id)
    }

    /// Current state of the account `id` resolves to.
    #[must_use]
    pub fn account(&self, id: &AccountId) -> Option<AccountSnapshot> {
        self.accounts.snapshot(&self.identity.canonical(id))
    }

    /// All canonical accounts, sorted by id.
    #[must_use]
    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        self.accounts.snapshots()
    }

    /// History of the account `id` resolves to, oldest first.
    #[must_use]
    pub fn history(&self, id: &AccountId) -> Option<&[HistoryEntry]> {
        self.history.entries(&self.identity.canonical(id))
    }

    /// A registered payment.
    #[must_use]
    pub fn payment(&self, payment_id: PaymentId) -> Option<&Payment> {
        self.payments.get(payment_id)
    }

    #[must_use]
    pub fn pending_cashback_count(&self) -> usize {
        self.cashback.len()
    }

    /// Earliest pending cashback maturity, if any.
    #[must_use]
    pub fn next_cashback_maturity(&self) -> Option<Timestamp> {
        self.cashback.next_maturity()
    }

    /// Number of account ids absorbed by merges.
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.identity.len()
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    // =================================================================
    // Invariants
    // =================================================================

    /// Check every cross-component invariant.
    ///
    /// Walks the whole ledger, so it is run at checkpoints rather than after
    /// each operation.
    ///
    /// # Errors
    /// The first violated invariant. Any error here is an engine defect.
    pub fn verify_invariants(&self) -> Result<()> {
        self.supply
            .verify(self.accounts.total_balance(), self.cashback.pending_total())?;
        let principal = self.payments.total_principal();
        if principal != self.supply.total_payments() {
            return Err(LedgerError::SupplyInvariantViolation {
                reason: format!(
                    "registered payments total {principal} != recorded {}",
                    self.supply.total_payments()
                ),
            });
        }
        self.history.verify()?;
        self.identity.verify()?;

        for snapshot in self.accounts.snapshots() {
            if self.identity.is_absorbed(&snapshot.id) {
                return Err(LedgerError::MergeCycle(snapshot.id));
            }
            if !self.history.contains(&snapshot.id) {
                return Err(LedgerError::Internal(format!(
                    "account {} has no history",
                    snapshot.id
                )));
            }
        }
        if let Some(orphan) = self
            .history
            .accounts()
            .into_iter()
            .find(|id| !self.accounts.contains(id))
        {
            return Err(LedgerError::Internal(format!(
                "history kept for missing account {orphan}"
            )));
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tally_types::constants::CASHBACK_DELAY_MS;

    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::from(s)
    }

    fn funded(accounts: &[(&str, Amount)]) -> Ledger {
        let mut ledger = Ledger::new();
        for (name, amount) in accounts {
            ledger.create_account(1, &id(name)).unwrap();
            if *amount > 0 {
                ledger.deposit(1, &id(name), *amount).unwrap();
            }
        }
        ledger
    }

    #[test]
    fn create_duplicate_fails() {
        let mut ledger = Ledger::new();
        ledger.create_account(1, &id("a")).unwrap();
        assert_eq!(
            ledger.create_account(2, &id("a")),
            Err(LedgerError::AccountExists(id("a")))
        );
        assert_eq!(ledger.history(&id("a")).unwrap().len(), 1);
    }

    #[test]
    fn deposit_to_missing_account() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.deposit(1, &id("x"), 10),
            Err(LedgerError::AccountNotFound(id("x")))
        );
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut ledger = funded(&[("a", 100), ("b", 0)]);
        assert_eq!(ledger.deposit(2, &id("a"), 0), Err(LedgerError::InvalidAmount(0)));
        assert_eq!(
            ledger.transfer(2, &id("a"), &id("b"), 0),
            Err(LedgerError::InvalidAmount(0))
        );
        assert_eq!(ledger.pay(2, &id("a"), 0), Err(LedgerError::InvalidAmount(0)));
        assert!(ledger.payments.is_empty());
    }

    #[test]
    fn transfer_records_both_sides() {
        let mut ledger = funded(&[("a", 100), ("b", 10)]);
        assert_eq!(ledger.transfer(5, &id("a"), &id("b"), 30).unwrap(), 70);
        assert_eq!(ledger.history(&id("a")).unwrap().last(), Some(&HistoryEntry::new(5, 70)));
        assert_eq!(ledger.history(&id("b")).unwrap().last(), Some(&HistoryEntry::new(5, 40)));
        assert_eq!(ledger.account(&id("a")).unwrap().outgoing, 30);
    }

    #[test]
    fn transfer_to_self_fails() {
        let mut ledger = funded(&[("a", 100)]);
        assert_eq!(
            ledger.transfer(5, &id("a"), &id("a"), 1),
            Err(LedgerError::SelfTransfer(id("a")))
        );
    }

    #[test]
    fn pay_schedules_cashback() {
        let mut ledger = funded(&[("a", 2000)]);
        let pid = ledger.pay(3, &id("a"), 1000).unwrap();
        assert_eq!(pid, PaymentId(1));
        assert_eq!(ledger.pending_cashback_count(), 1);
        assert_eq!(ledger.next_cashback_maturity(), Some(3 + CASHBACK_DELAY_MS));
        assert_eq!(ledger.payment(pid).unwrap().cashback, 20);
        assert_eq!(ledger.account(&id("a")).unwrap().outgoing, 1000);
    }

    #[test]
    fn cashback_applies_at_maturity_not_before() {
        let mut ledger = funded(&[("a", 2000)]);
        let pid = ledger.pay(3, &id("a"), 1000).unwrap();

        ledger.sweep_cashback(3 + CASHBACK_DELAY_MS - 1);
        assert_eq!(ledger.account(&id("a")).unwrap().balance, 1000);
        assert_eq!(ledger.payment(pid).unwrap().status, PaymentStatus::InProgress);

        ledger.sweep_cashback(3 + CASHBACK_DELAY_MS);
        assert_eq!(ledger.account(&id("a")).unwrap().balance, 1020);
        assert_eq!(
            ledger.payment(pid).unwrap().status,
            PaymentStatus::CashbackReceived
        );
        assert_eq!(
            ledger.history(&id("a")).unwrap().last(),
            Some(&HistoryEntry::new(3 + CASHBACK_DELAY_MS, 1020))
        );
    }

    #[test]
    fn cashback_history_uses_maturity_time() {
        let mut ledger = funded(&[("a", 1000)]);
        ledger.pay(10, &id("a"), 500).unwrap();
        let late = 10 + CASHBACK_DELAY_MS + 5_000;
        ledger.deposit(late, &id("a"), 1).unwrap();

        let tail: Vec<_> = ledger.history(&id("a")).unwrap().iter().rev().take(2).copied().collect();
        assert_eq!(tail[0], HistoryEntry::new(late, 511));
        assert_eq!(tail[1], HistoryEntry::new(10 + CASHBACK_DELAY_MS, 510));
    }

    #[test]
    fn status_requires_ownership() {
        let mut ledger = funded(&[("a", 100), ("b", 100)]);
        let pid = ledger.pay(2, &id("a"), 50).unwrap();
        assert_eq!(
            ledger.payment_status(3, &id("b"), pid),
            Err(LedgerError::PaymentNotOwned {
                payment: pid,
                account: id("b")
            })
        );
        assert_eq!(
            ledger.payment_status(3, &id("a"), PaymentId(99)),
            Err(LedgerError::PaymentNotFound(PaymentId(99)))
        );
        assert_eq!(
            ledger.payment_status(3, &id("nobody"), pid),
            Err(LedgerError::AccountNotFound(id("nobody")))
        );
    }

    #[test]
    fn merge_moves_everything_to_survivor() {
        let mut ledger = funded(&[("a", 100), ("b", 50)]);
        ledger.pay(2, &id("b"), 20).unwrap();
        ledger.merge_accounts(3, &id("a"), &id("b")).unwrap();

        let a = ledger.account(&id("a")).unwrap();
        assert_eq!(a.balance, 130);
        assert_eq!(a.outgoing, 20);
        assert_eq!(ledger.canonical_id(&id("b")), id("a"));
        assert_eq!(ledger.accounts().len(), 1);
        assert_eq!(ledger.history(&id("a")).unwrap().last(), Some(&HistoryEntry::new(3, 130)));
    }

    #[test]
    fn merged_count_tracks_absorbed_ids() {
        let mut ledger = funded(&[("a", 0), ("b", 0), ("c", 0)]);
        assert_eq!(ledger.merged_count(), 0);
        ledger.merge_accounts(2, &id("a"), &id("b")).unwrap();
        ledger.merge_accounts(3, &id("c"), &id("a")).unwrap();
        assert_eq!(ledger.merged_count(), 2);
    }

    #[test]
    fn unrecorded_payment_breaks_invariants() {
        let mut ledger = funded(&[("a", 100)]);
        ledger.pay(2, &id("a"), 10).unwrap();
        assert!(ledger.verify_invariants().is_ok());

        ledger.payments.register(id("a"), 3, 5, 0);
        assert!(matches!(
            ledger.verify_invariants(),
            Err(LedgerError::SupplyInvariantViolation { .. })
        ));
    }

    #[test]
    fn merge_failures() {
        let mut ledger = funded(&[("a", 100), ("b", 50)]);
        assert_eq!(
            ledger.merge_accounts(2, &id("a"), &id("a")),
            Err(LedgerError::SelfMerge(id("a")))
        );
        assert_eq!(
            ledger.merge_accounts(2, &id("a"), &id("zz")),
            Err(LedgerError::AccountNotFound(id("zz")))
        );
        ledger.merge_accounts(3, &id("a"), &id("b")).unwrap();
        assert_eq!(
            ledger.merge_accounts(4, &id("a"), &id("b")),
            Err(LedgerError::SelfMerge(id("a")))
        );
    }

    #[test]
    fn recreating_absorbed_id_fails() {
        let mut ledger = funded(&[("a", 0), ("b", 0)]);
        ledger.merge_accounts(2, &id("a"), &id("b")).unwrap();
        assert_eq!(
            ledger.create_account(3, &id("b")),
            Err(LedgerError::AccountExists(id("a")))
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = LedgerConfig {
            cashback_rate_bps: 20_000,
            ..LedgerConfig::default()
        };
        assert!(matches!(
            Ledger::with_config(cfg),
            Err(LedgerError::Configuration(_))
        ));
    }

    #[test]
    fn custom_config_changes_cashback() {
        let cfg = LedgerConfig {
            cashback_delay_ms: 10,
            cashback_rate_bps: 1_000,
        };
        let mut ledger = Ledger::with_config(cfg).unwrap();
        ledger.create_account(0, &id("a")).unwrap();
        ledger.deposit(0, &id("a"), 1000).unwrap();
        ledger.pay(5, &id("a"), 500).unwrap();
        assert_eq!(ledger.deposit(15, &id("a"), 1).unwrap(), 500 + 50 + 1);
    }
}
