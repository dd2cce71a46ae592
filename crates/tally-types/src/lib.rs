//! # tally-types
//!
//! Shared types, errors, and configuration for the **Tally** ledger engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`PaymentId`], [`Timestamp`], [`Amount`]
//! - **Account model**: [`AccountSnapshot`], [`HistoryEntry`]
//! - **Payment model**: [`Payment`], [`PaymentStatus`], [`PendingCashback`]
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`LedgerError`] with `TL_ERR_` prefix codes
//! - **Constants**: cashback delay and rate defaults

pub mod account;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod payment;

// Re-export all primary types at crate root for ergonomic imports:
//   use tally_types::{AccountId, Payment, LedgerError, ...};

pub use account::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use payment::*;

// Constants are accessed via `tally_types::constants::FOO`
// (not re-exported to avoid name collisions).
