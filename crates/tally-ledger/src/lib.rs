//! # tally-ledger
//!
//! **In-memory transactional ledger** for the Tally engine: balances,
//! payments with deferred cashback, account merges, and point-in-time
//! balance history.
//!
//! ## Architecture
//!
//! [`Ledger`] owns one instance of each component and is the only
//! mutation surface:
//! 1. **IdentityResolver**: follows merge redirects to a canonical id
//! 2. **AccountBook**: balances and outgoing totals of canonical accounts
//! 3. **HistoryLedger**: per-account time-ordered balance snapshots
//! 4. **CashbackScheduler**: min-heap of pending credits by maturity time
//! 5. **PaymentRegistry**: payment ids, owners, and statuses
//! 6. **ranking**: top spenders, computed on demand
//! 7. **SupplyConservation**: running totals checked by [`Ledger::verify_invariants`]
//!
//! ## Operation Flow
//!
//! ```text
//! call(timestamp, ids..) → sweep matured cashback → resolve ids
//!     → validate → mutate AccountBook → record HistoryLedger
//! ```
//!
//! Every failure is reported as a [`tally_types::LedgerError`] before any
//! state changes.

pub mod accounts;
pub mod cashback;
pub mod conservation;
pub mod digest;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod payments;
pub mod ranking;
pub mod system;

pub use accounts::AccountBook;
pub use cashback::CashbackScheduler;
pub use conservation::SupplyConservation;
pub use history::HistoryLedger;
pub use identity::IdentityResolver;
pub use ledger::Ledger;
pub use payments::PaymentRegistry;
pub use ranking::{SpenderRank, top_spenders};
pub use system::BankingSystem;
