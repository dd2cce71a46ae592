//! Identifiers used throughout Tally.
//!
//! Account identifiers are opaque caller-supplied strings. Payment
//! identifiers are engine-generated sequence numbers rendered as
//! `payment<N>`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{LedgerError, constants::PAYMENT_ID_PREFIX};

/// Logical time in milliseconds, supplied by the caller.
pub type Timestamp = u64;

/// Money in the smallest currency unit.
pub type Amount = u64;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Caller-supplied account identifier.
///
/// Ordering is lexicographic on the underlying string; the spender ranking
/// uses it to break ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// PaymentId
// ---------------------------------------------------------------------------

/// Engine-generated payment identifier.
///
/// Allocated from a per-ledger sequence starting at 1, so identifiers are
/// unique and increase with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PaymentId(pub u64);

impl PaymentId {
    /// The identifier following this one in the sequence.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PAYMENT_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for PaymentId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the canonical rendering is accepted: "payment07" is not "payment7".
        s.strip_prefix(PAYMENT_ID_PREFIX)
            .and_then(|digits| {
                digits
                    .parse::<u64>()
                    .ok()
                    .filter(|n| n.to_string() == digits)
            })
            .map(Self)
            .ok_or_else(|| LedgerError::MalformedPaymentId(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
