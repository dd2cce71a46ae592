//! String-level banking interface.
//!
//! [`BankingSystem`] is the plain operation surface: string ids in,
//! `Option`/`bool`/`Vec<String>` out, with every failure collapsed into
//! `None` or `false`. [`Ledger`] implements it on top of its typed API.
//!
//! `Ledger` has inherent methods with some of the same names, so call
//! these through the trait (a `dyn BankingSystem` or a generic bound).

use tally_types::{AccountId, PaymentId};

use crate::Ledger;

/// The eight ledger operations over plain strings and integers.
pub trait BankingSystem {
    /// `true` if the account was created.
    fn create_account(&mut self, timestamp: u64, account_id: &str) -> bool;

    /// New balance, or `None` if the account does not exist.
    fn deposit(&mut self, timestamp: u64, account_id: &str, amount: u64) -> Option<u64>;

    /// New source balance, or `None` on any failure.
    fn transfer(
        &mut self,
        timestamp: u64,
        source_account_id: &str,
        target_account_id: &str,
        amount: u64,
    ) -> Option<u64>;

    /// New payment id such as `"payment1"`, or `None` on any failure.
    fn pay(&mut self, timestamp: u64, account_id: &str, amount: u64) -> Option<String>;

    /// `"IN_PROGRESS"` or `"CASHBACK_RECEIVED"`, or `None` if the account or
    /// payment is unknown or the payment belongs to someone else.
    fn get_payment_status(
        &mut self,
        timestamp: u64,
        account_id: &str,
        payment: &str,
    ) -> Option<String>;

    /// Up to `n` entries formatted as `"id(outgoing)"`.
    fn top_spenders(&mut self, timestamp: u64, n: usize) -> Vec<String>;

    /// `true` if `account_id_2` was merged into `account_id_1`.
    fn merge_accounts(&mut self, timestamp: u64, account_id_1: &str, account_id_2: &str) -> bool;

    /// Balance at `time_at`, or `None` if unknown or the account does not
    /// exist.
    fn get_balance(&mut self, timestamp: u64, account_id: &str, time_at: u64) -> Option<u64>;
}

impl BankingSystem for Ledger {
    fn create_account(&mut self, timestamp: u64, account_id: &str) -> bool {
        Ledger::create_account(self, timestamp, &AccountId::from(account_id)).is_ok()
    }

    fn deposit(&mut self, timestamp: u64, account_id: &str, amount: u64) -> Option<u64> {
        Ledger::deposit(self, timestamp, &AccountId::from(account_id), amount).ok()
    }

    fn transfer(
        &mut self,
        timestamp: u64,
        source_account_id: &str,
        target_account_id: &str,
        amount: u64,
    ) -> Option<u64> {
        Ledger::transfer(
            self,
            timestamp,
            &AccountId::from(source_account_id),
            &AccountId::from(target_account_id),
            amount,
        )
        .ok()
    }

    fn pay(&mut self, timestamp: u64, account_id: &str, amount: u64) -> Option<String> {
        Ledger::pay(self, timestamp, &AccountId::from(account_id), amount)
            .ok()
            .map(|id| id.to_string())
    }

    fn get_payment_status(
        &mut self,
        timestamp: u64,
        account_id: &str,
        payment: &str,
    ) -> Option<String> {
        let account = AccountId::from(account_id);
        match payment.parse::<PaymentId>() {
            Ok(payment_id) => self
                .payment_status(timestamp, &account, payment_id)
                .ok()
                .map(|status| status.to_string()),
            Err(_) => {
                // An unparseable id names no payment, but the sweep still runs.
                self.sweep_cashback(timestamp);
                None
            }
        }
    }

    fn top_spenders(&mut self, timestamp: u64, n: usize) -> Vec<String> {
        Ledger::top_spenders(self, timestamp, n)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn merge_accounts(&mut self, timestamp: u64, account_id_1: &str, account_id_2: &str) -> bool {
        Ledger::merge_accounts(
            self,
            timestamp,
            &AccountId::from(account_id_1),
            &AccountId::from(account_id_2),
        )
        .is_ok()
    }

    fn get_balance(&mut self, timestamp: u64, account_id: &str, time_at: u64) -> Option<u64> {
        self.balance_at(timestamp, &AccountId::from(account_id), time_at)
            .ok()
            .flatten()
    }
}
