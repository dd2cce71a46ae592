//! Configuration for a Tally ledger instance.

use serde::{Deserialize, Serialize};

use crate::{Amount, LedgerError, Result, constants};

/// Tunables of the cashback program.
///
/// Missing fields fall back to the defaults in [`constants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Delay between a payment and its cashback credit, in milliseconds.
    pub cashback_delay_ms: u64,
    /// Cashback rate in basis points of the payment amount.
    pub cashback_rate_bps: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            cashback_delay_ms: constants::CASHBACK_DELAY_MS,
            cashback_rate_bps: constants::CASHBACK_RATE_BPS,
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON config and validate it.
    ///
    /// # Errors
    /// `Serialization` on malformed JSON, `Configuration` on invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject rates above 100%.
    ///
    /// # Errors
    /// Returns `Configuration` if the rate exceeds the bps denominator.
    pub fn validate(&self) -> Result<()> {
        if self.cashback_rate_bps > constants::BPS_DENOMINATOR {
            return Err(LedgerError::Configuration(format!(
                "cashback_rate_bps {} exceeds {}",
                self.cashback_rate_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        Ok(())
    }

    /// Cashback owed for a payment of `amount`, rounded down.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cashback_for(&self, amount: Amount) -> Amount {
        // Rate is at most 100%, so the quotient never exceeds `amount`.
        (u128::from(amount) * u128::from(self.cashback_rate_bps)
            / u128::from(constants::BPS_DENOMINATOR)) as Amount
    }
}
