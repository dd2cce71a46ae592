//! Error types for the Tally ledger engine.
//!
//! All errors use the `TL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Account errors
//! - 2xx: Balance / amount errors
//! - 3xx: Payment errors
//! - 9xx: Configuration, serialization, and internal invariant errors

use thiserror::Error;

use crate::{AccountId, Amount, PaymentId, Timestamp};

/// Central error enum for all Tally operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    // =================================================================
    // Account Errors (1xx)
    // =================================================================
    /// The account does not resolve to a live canonical account.
    #[error("TL_ERR_100: Account not found: {0}")]
    AccountNotFound(AccountId),

    /// A canonical account with this identifier already exists.
    #[error("TL_ERR_101: Account already exists: {0}")]
    AccountExists(AccountId),

    /// Source and target of a transfer resolve to the same account.
    #[error("TL_ERR_102: Transfer source and target are the same account: {0}")]
    SelfTransfer(AccountId),

    /// Both sides of a merge resolve to the same account.
    #[error("TL_ERR_103: Cannot merge account into itself: {0}")]
    SelfMerge(AccountId),

    // =================================================================
    // Balance / Amount Errors (2xx)
    // =================================================================
    /// Not enough balance to perform the debit.
    #[error("TL_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// Amounts must be strictly positive.
    #[error("TL_ERR_201: Invalid amount: {0}")]
    InvalidAmount(Amount),

    /// A credit would overflow the balance representation.
    #[error("TL_ERR_202: Balance overflow on account {0}")]
    BalanceOverflow(AccountId),

    // =================================================================
    // Payment Errors (3xx)
    // =================================================================
    /// No payment with this identifier was ever registered.
    #[error("TL_ERR_300: Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The payment exists but belongs to a different canonical account.
    #[error("TL_ERR_301: Payment {payment} is not owned by account {account}")]
    PaymentNotOwned {
        payment: PaymentId,
        account: AccountId,
    },

    /// The string is not a rendering of a payment identifier.
    #[error("TL_ERR_302: Malformed payment id: {0}")]
    MalformedPaymentId(String),

    /// The payment status transition is not allowed.
    #[error("TL_ERR_303: Invalid payment status transition for {0}")]
    InvalidStatusTransition(PaymentId),

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Supply conservation invariant violated — implementation defect.
    #[error("TL_ERR_900: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// An account's history is not ordered by timestamp.
    #[error("TL_ERR_901: History out of order for {account} at t={timestamp}")]
    HistoryOutOfOrder {
        account: AccountId,
        timestamp: Timestamp,
    },

    /// The merge graph contains a cycle or points at a non-canonical id.
    #[error("TL_ERR_902: Merge graph corrupted at {0}")]
    MergeCycle(AccountId),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("TL_ERR_903: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("TL_ERR_904: Serialization error: {0}")]
    Serialization(String),

    /// Component state disagrees with itself — implementation defect.
    #[error("TL_ERR_905: Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Whether this error belongs to the "not found" class: the referenced
    /// account or payment does not resolve to a live entity the caller owns.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_)
                | Self::PaymentNotFound(_)
                | Self::PaymentNotOwned { .. }
                | Self::MalformedPaymentId(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
