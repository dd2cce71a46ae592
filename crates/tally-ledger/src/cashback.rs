//! Deferred cashback queue.
//!
//! Pending credits sit in a min-heap keyed by maturity time. Before every
//! balance-dependent operation the ledger drains all credits that have
//! matured by the operation's timestamp, so nothing is rescanned and each
//! credit leaves the queue exactly once.

use std::{cmp::Reverse, collections::BinaryHeap};

use tally_types::{AccountId, Amount, PaymentId, PendingCashback, Timestamp};

/// Min-heap of pending cashback credits ordered by maturity.
#[derive(Debug, Default, Clone)]
pub struct CashbackScheduler {
    pending: BinaryHeap<Reverse<PendingCashback>>,
}

impl CashbackScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: BinaryHeap::new(),
        }
    }

    /// Queue a credit of `amount` to `beneficiary` at `matures_at`.
    pub fn schedule(
        &mut self,
        matures_at: Timestamp,
        beneficiary: AccountId,
        amount: Amount,
        payment_id: PaymentId,
    ) {
        self.pending.push(Reverse(PendingCashback {
            matures_at,
            beneficiary,
            amount,
            payment_id,
        }));
    }

    /// Remove and return every credit with `matures_at <= now`, earliest
    /// first. A second call with the same `now` returns nothing.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<PendingCashback> {
        let mut due = Vec::new();
        while self
            .pending
            .peek()
            .is_some_and(|Reverse(next)| next.matures_at <= now)
        {
            if let Some(Reverse(item)) = self.pending.pop() {
                due.push(item);
            }
        }
        due
    }

    /// Earliest pending maturity time, if any.
    #[must_use]
    pub fn next_maturity(&self) -> Option<Timestamp> {
        self.pending.peek().map(|Reverse(item)| item.matures_at)
    }

    /// Sum of all pending credits.
    #[must_use]
    pub fn pending_total(&self) -> u128 {
        self.pending
            .iter()
            .map(|Reverse(item)| u128::from(item.amount))
            .sum()
    }

    /// All pending credits in drain order.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingCashback> {
        let mut items: Vec<_> = self.pending.iter().map(|Reverse(item)| item.clone()).collect();
        items.sort();
        items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> CashbackScheduler {
        let mut s = CashbackScheduler::new();
        s.schedule(300, AccountId::from("c"), 3, PaymentId(3));
        s.schedule(100, AccountId::from("a"), 1, PaymentId(1));
        s.schedule(200, AccountId::from("b"), 2, PaymentId(2));
        s
    }

    #[test]
    fn nothing_due_before_maturity() {
        let mut s = scheduler();
        assert!(s.drain_due(99).is_empty());
        assert_eq!(s.len(), 3);
        assert_eq!(s.next_maturity(), Some(100));
    }

    #[test]
    fn maturity_is_inclusive() {
        let mut s = scheduler();
        let due = s.drain_due(100);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].payment_id, PaymentId(1));
    }

    #[test]
    fn drains_in_maturity_order() {
        let mut s = scheduler();
        let due = s.drain_due(1_000);
        let ids: Vec<_> = due.iter().map(|c| c.payment_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(s.is_empty());
    }

    #[test]
    fn drain_is_idempotent() {
        let mut s = scheduler();
        assert_eq!(s.drain_due(250).len(), 2);
        assert!(s.drain_due(250).is_empty());
        assert_eq!(s.pending_total(), 3);
    }

    #[test]
    fn same_maturity_drains_by_payment_order() {
        let mut s = CashbackScheduler::new();
        s.schedule(50, AccountId::from("x"), 1, PaymentId(8));
        s.schedule(50, AccountId::from("y"), 1, PaymentId(2));
        let ids: Vec<_> = s.drain_due(50).iter().map(|c| c.payment_id.0).collect();
        assert_eq!(ids, vec![2, 8]);
    }

    #[test]
    fn pending_listing_is_sorted() {
        let s = scheduler();
        let listed: Vec<_> = s.pending().iter().map(|c| c.matures_at).collect();
        assert_eq!(listed, vec![100, 200, 300]);
        assert_eq!(s.pending_total(), 6);
    }
}
