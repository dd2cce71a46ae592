//! # tally-replay
//!
//! Serde model of the ledger operations and a driver that feeds a stream
//! of them into a [`Ledger`].
//!
//! An operation file is either a JSON array or one JSON object per line:
//!
//! ```text
//! {"op":"create_account","timestamp":1,"account_id":"acc1"}
//! {"op":"deposit","timestamp":2,"account_id":"acc1","amount":2000}
//! {"op":"pay","timestamp":3,"account_id":"acc1","amount":1000}
//! ```
//!
//! Each operation yields exactly one [`Outcome`]; failures become
//! [`Outcome::Rejected`] carrying the error's `TL_ERR_` code and message.

use serde::{Deserialize, Serialize};
use tally_ledger::Ledger;
use tally_types::{AccountId, Amount, LedgerError, PaymentId, PaymentStatus, Result, Timestamp};

/// One ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateAccount {
        timestamp: Timestamp,
        account_id: AccountId,
    },
    Deposit {
        timestamp: Timestamp,
        account_id: AccountId,
        amount: Amount,
    },
    Transfer {
        timestamp: Timestamp,
        source_id: AccountId,
        target_id: AccountId,
        amount: Amount,
    },
    Pay {
        timestamp: Timestamp,
        account_id: AccountId,
        amount: Amount,
    },
    GetPaymentStatus {
        timestamp: Timestamp,
        account_id: AccountId,
        /// Kept as text so malformed ids replay as a rejection.
        payment_id: String,
    },
    TopSpenders {
        timestamp: Timestamp,
        n: usize,
    },
    MergeAccounts {
        timestamp: Timestamp,
        account_id_1: AccountId,
        account_id_2: AccountId,
    },
    GetBalance {
        timestamp: Timestamp,
        account_id: AccountId,
        time_at: Timestamp,
    },
}

/// Result of one [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Created,
    /// New balance after a deposit, or the source balance after a transfer.
    Balance(Amount),
    Payment(String),
    Status(PaymentStatus),
    Spenders(Vec<String>),
    Merged,
    /// `None` when the queried time precedes the account's creation.
    BalanceAt(Option<Amount>),
    Rejected(String),
}

impl From<LedgerError> for Outcome {
    fn from(err: LedgerError) -> Self {
        Self::Rejected(err.to_string())
    }
}

impl Operation {
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::CreateAccount { timestamp, .. }
            | Self::Deposit { timestamp, .. }
            | Self::Transfer { timestamp, .. }
            | Self::Pay { timestamp, .. }
            | Self::GetPaymentStatus { timestamp, .. }
            | Self::TopSpenders { timestamp, .. }
            | Self::MergeAccounts { timestamp, .. }
            | Self::GetBalance { timestamp, .. } => *timestamp,
        }
    }

    /// Run this operation against `ledger`.
    pub fn apply(&self, ledger: &mut Ledger) -> Outcome {
        let result = match self {
            Self::CreateAccount {
                timestamp,
                account_id,
            } => ledger
                .create_account(*timestamp, account_id)
                .map(|()| Outcome::Created),
            Self::Deposit {
                timestamp,
                account_id,
                amount,
            } => ledger
                .deposit(*timestamp, account_id, *amount)
                .map(Outcome::Balance),
            Self::Transfer {
                timestamp,
                source_id,
                target_id,
                amount,
            } => ledger
                .transfer(*timestamp, source_id, target_id, *amount)
                .map(Outcome::Balance),
            Self::Pay {
                timestamp,
                account_id,
                amount,
            } => ledger
                .pay(*timestamp, account_id, *amount)
                .map(|id| Outcome::Payment(id.to_string())),
            Self::GetPaymentStatus {
                timestamp,
                account_id,
                payment_id,
            } => match payment_id.parse::<PaymentId>() {
                Ok(payment_id) => ledger
                    .payment_status(*timestamp, account_id, payment_id)
                    .map(Outcome::Status),
                Err(err) => {
                    ledger.sweep_cashback(*timestamp);
                    Err(err)
                }
            },
            Self::TopSpenders { timestamp, n } => Ok(Outcome::Spenders(
                ledger
                    .top_spenders(*timestamp, *n)
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            )),
            Self::MergeAccounts {
                timestamp,
                account_id_1,
                account_id_2,
            } => ledger
                .merge_accounts(*timestamp, account_id_1, account_id_2)
                .map(|()| Outcome::Merged),
            Self::GetBalance {
                timestamp,
                account_id,
                time_at,
            } => ledger
                .balance_at(*timestamp, account_id, *time_at)
                .map(Outcome::BalanceAt),
        };
        result.unwrap_or_else(Outcome::from)
    }
}

/// Apply `ops` in order and collect one outcome per operation.
pub fn replay<'a>(ledger: &mut Ledger, ops: impl IntoIterator<Item = &'a Operation>) -> Vec<Outcome> {
    ops.into_iter().map(|op| op.apply(ledger)).collect()
}

/// Parse an operation stream: a JSON array, or JSON lines (blank lines
/// ignored).
///
/// # Errors
/// `Serialization` naming the first line that fails to parse.
pub fn load_operations(input: &str) -> Result<Vec<Operation>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|err| LedgerError::Serialization(format!("line {}: {err}", idx + 1)))
        })
        .collect()
}

/// End-of-run report printed after the outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub operations: usize,
    pub rejected: usize,
    pub accounts: usize,
    pub merged_accounts: usize,
    pub pending_cashback: usize,
    pub state_digest: String,
}

impl ReplaySummary {
    #[must_use]
    pub fn new(ledger: &Ledger, outcomes: &[Outcome]) -> Self {
        Self {
            operations: outcomes.len(),
            rejected: outcomes
                .iter()
                .filter(|o| matches!(o, Outcome::Rejected(_)))
                .count(),
            accounts: ledger.accounts().len(),
            merged_accounts: ledger.merged_count(),
            pending_cashback: ledger.pending_cashback_count(),
            state_digest: ledger.state_digest_hex(),
        }
    }
}
