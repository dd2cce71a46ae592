//! Top-spender ranking over outgoing totals.
//!
//! Computed on demand: highest outgoing total first, ties broken by
//! ascending account id. Accounts that never spent are still ranked.

use std::{cmp::Ordering, fmt};

use tally_types::{AccountId, Amount};

/// One row of the spender ranking. Displays as `id(amount)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpenderRank {
    pub account: AccountId,
    pub outgoing: Amount,
}

impl fmt::Display for SpenderRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.account, self.outgoing)
    }
}

fn rank_order(a: &SpenderRank, b: &SpenderRank) -> Ordering {
    b.outgoing
        .cmp(&a.outgoing)
        .then_with(|| a.account.cmp(&b.account))
}

/// The `n` largest spenders among `totals`.
pub fn top_spenders<'a>(
    totals: impl IntoIterator<Item = (&'a AccountId, Amount)>,
    n: usize,
) -> Vec<SpenderRank> {
    let mut ranks: Vec<SpenderRank> = totals
        .into_iter()
        .map(|(account, outgoing)| SpenderRank {
            account: account.clone(),
            outgoing,
        })
        .collect();

    if n == 0 {
        return Vec::new();
    }
    if n < ranks.len() {
        ranks.select_nth_unstable_by(n - 1, rank_order);
        ranks.truncate(n);
    }
    ranks.sort_by(rank_order);
    ranks
}
