//! Randomized operation streams.
//!
//! Drives the ledger with seeded pseudo-random calls (valid and invalid,
//! with timestamps that sometimes jump past cashback maturity) and checks
//! cross-component invariants after every step.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tally_ledger::{BankingSystem, Ledger};
use tally_types::{AccountId, PaymentId, constants::CASHBACK_DELAY_MS};

const NAMES: [&str; 6] = ["acc1", "acc2", "acc3", "acc10", "bob", "zed"];

fn pick(rng: &mut StdRng) -> AccountId {
    AccountId::from(NAMES[rng.gen_range(0..NAMES.len())])
}

/// Run `steps` random operations and return the ledger.
fn drive(seed: u64, steps: usize) -> Ledger {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ledger = Ledger::new();
    let mut now = 1u64;

    for step in 0..steps {
        now += if rng.gen_ratio(1, 20) {
            CASHBACK_DELAY_MS / 2
        } else {
            rng.gen_range(0..1_000)
        };

        let _ = match rng.gen_range(0..8) {
            0 => ledger.create_account(now, &pick(&mut rng)).map(|()| 0),
            1 => ledger.deposit(now, &pick(&mut rng), rng.gen_range(0..5_000)),
            2 => ledger.transfer(now, &pick(&mut rng), &pick(&mut rng), rng.gen_range(0..2_000)),
            3 => ledger
                .pay(now, &pick(&mut rng), rng.gen_range(0..2_000))
                .map(|id| id.sequence()),
            4 => ledger
                .payment_status(now, &pick(&mut rng), PaymentId(rng.gen_range(1..40)))
                .map(|_| 0),
            5 => Ok(ledger.top_spenders(now, rng.gen_range(0..8)).len() as u64),
            6 => ledger
                .merge_accounts(now, &pick(&mut rng), &pick(&mut rng))
                .map(|()| 0),
            _ => ledger
                .balance_at(now, &pick(&mut rng), rng.gen_range(0..=now))
                .map(Option::unwrap_or_default),
        };

        if let Err(err) = ledger.verify_invariants() {
            panic!("seed {seed} step {step}: {err}");
        }
    }
    ledger
}

#[test]
fn invariants_hold_over_random_streams() {
    for seed in 0..32 {
        drive(seed, 400);
    }
}

#[test]
fn same_seed_same_state() {
    assert_eq!(drive(7, 300).state_digest(), drive(7, 300).state_digest());
}

#[test]
fn every_payment_eventually_settles() {
    for seed in 0..8 {
        let mut ledger = drive(seed, 300);
        let horizon = ledger
            .next_cashback_maturity()
            .unwrap_or(0)
            .saturating_add(2 * CASHBACK_DELAY_MS);
        ledger.sweep_cashback(horizon);

        assert_eq!(ledger.pending_cashback_count(), 0);
        let supply = ledger.supply();
        let balances: u128 = ledger.accounts().iter().map(|a| u128::from(a.balance)).sum();
        assert_eq!(
            balances,
            supply.total_deposits() + supply.total_cashback_credited() - supply.total_payments()
        );
    }
}

#[test]
fn latest_history_entry_matches_balance() {
    // Timestamps in `drive` never go backwards.
    let ledger = drive(11, 500);
    for account in ledger.accounts() {
        let history = ledger.history(&account.id).unwrap();
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(history.last().map(|e| e.balance), Some(account.balance));
    }
}

#[test]
fn string_interface_agrees_with_typed_interface() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut typed = Ledger::new();
    let mut bank: Box<dyn BankingSystem> = Box::new(Ledger::new());

    for now in 1..300u64 {
        let who = pick(&mut rng);
        let amount = rng.gen_range(0..500);
        match rng.gen_range(0..3) {
            0 => assert_eq!(
                typed.create_account(now, &who).is_ok(),
                bank.create_account(now, who.as_str())
            ),
            1 => assert_eq!(
                typed.deposit(now, &who, amount).ok(),
                bank.deposit(now, who.as_str(), amount)
            ),
            _ => assert_eq!(
                typed.pay(now, &who, amount).ok().map(|id| id.to_string()),
                bank.pay(now, who.as_str(), amount)
            ),
        }
    }
    assert_eq!(
        typed.top_spenders(300, 10).iter().map(ToString::to_string).collect::<Vec<_>>(),
        bank.top_spenders(300, 10)
    );
}
