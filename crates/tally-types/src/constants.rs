//! System-wide constants for the Tally ledger engine.

/// Delay between a payment and its cashback credit (24 hours in milliseconds).
pub const CASHBACK_DELAY_MS: u64 = 86_400_000;

/// Cashback rate in basis points (200 bps = 2%).
pub const CASHBACK_RATE_BPS: u64 = 200;

/// Denominator for basis-point arithmetic.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Textual prefix of every payment identifier (`payment1`, `payment2`, ...).
pub const PAYMENT_ID_PREFIX: &str = "payment";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Tally";
