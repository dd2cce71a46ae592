//! Deterministic state digest.
//!
//! Two ledgers in the same observable state produce the same SHA-256
//! digest, regardless of hash-map iteration order or how far merge chains
//! have been compressed. Useful for comparing replays and for checking
//! that a repeated sweep changed nothing.

use sha2::{Digest, Sha256};

use crate::Ledger;

fn put_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl Ledger {
    /// SHA-256 over a canonical encoding of the full ledger state.
    #[must_use]
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"tally:state:v1:");

        let accounts = self.accounts.snapshots();
        hasher.update((accounts.len() as u64).to_le_bytes());
        for account in &accounts {
            put_str(&mut hasher, account.id.as_str());
            hasher.update(account.balance.to_le_bytes());
            hasher.update(account.outgoing.to_le_bytes());

            let entries = self.history.entries(&account.id).unwrap_or_default();
            hasher.update((entries.len() as u64).to_le_bytes());
            for entry in entries {
                hasher.update(entry.timestamp.to_le_bytes());
                hasher.update(entry.balance.to_le_bytes());
            }
        }

        // Absorbed id -> canonical id, not raw edges: compression must not
        // change the digest.
        let redirects = self.identity.redirects();
        hasher.update((redirects.len() as u64).to_le_bytes());
        for (absorbed, canonical) in &redirects {
            put_str(&mut hasher, absorbed.as_str());
            put_str(&mut hasher, canonical.as_str());
        }

        let last_payment = self.payments.last_id().map_or(0, |id| id.sequence());
        hasher.update(last_payment.to_le_bytes());
        hasher.update((self.payments.len() as u64).to_le_bytes());
        for payment in self.payments.iter() {
            hasher.update(payment.id.0.to_le_bytes());
            put_str(&mut hasher, payment.owner.as_str());
            hasher.update(payment.timestamp.to_le_bytes());
            hasher.update(payment.amount.to_le_bytes());
            hasher.update(payment.cashback.to_le_bytes());
            put_str(&mut hasher, &payment.status.to_string());
        }

        let pending = self.cashback.pending();
        hasher.update((pending.len() as u64).to_le_bytes());
        for item in &pending {
            hasher.update(item.matures_at.to_le_bytes());
            put_str(&mut hasher, item.beneficiary.as_str());
            hasher.update(item.amount.to_le_bytes());
            hasher.update(item.payment_id.0.to_le_bytes());
        }

        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }

    /// Hex rendering of [`Ledger::state_digest`].
    #[must_use]
    pub fn state_digest_hex(&self) -> String {
        hex::encode(self.state_digest())
    }
}
