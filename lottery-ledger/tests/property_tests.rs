//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - Order: the roster lists entrants exactly as accepted, repeats included
//! - Threshold: entries below the minimum never change roster or pool
//! - Authorization: only the manager can settle
//! - Atomic settlement: roster and pool are both empty after a payout
//! - Conservation: pool == Σ(accepted entries), and payouts equal the pool
//! - Precision: no accepted entry is ever rounded into the pool

use lottery_ledger::{
    AccountId, Config, Error, FixedIndex, InMemoryAccounts, LotteryEngine, LotteryLedger,
    SeededRandom,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Minimum entry used throughout (0.01 units)
fn minimum() -> Decimal {
    Decimal::new(1, 2)
}

fn manager() -> AccountId {
    AccountId::new("manager")
}

/// Strategy for amounts at or above the minimum (0.01 .. 1000.00, in 0.001 steps)
fn valid_amount_strategy() -> impl Strategy<Value = Decimal> {
    (10i64..1_000_000i64).prop_map(|milli| Decimal::new(milli, 3))
}

/// Strategy for amounts strictly below the minimum (down to 1e-18)
fn small_amount_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (0i64..10i64).prop_map(|milli| Decimal::new(milli, 3)),
        (1i64..10_000_000_000_000_000i64).prop_map(|atto| Decimal::new(atto, 18)),
    ]
}

/// Strategy for amounts carrying digits past the smallest unit (scale 19..=28)
fn sub_unit_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..i64::MAX, 19u32..=28)
        .prop_filter("last digit must be significant", |(mantissa, _)| mantissa % 10 != 0)
        .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

/// Strategy for full-precision amounts in 1e-18 units (0.01 .. 1e10 units)
fn atto_amount_strategy() -> impl Strategy<Value = i128> {
    10i128.pow(16)..10i128.pow(28)
}

/// Strategy for entrant identities drawn from a small pool so repeats occur
fn player_strategy() -> impl Strategy<Value = AccountId> {
    (0u8..6).prop_map(|i| AccountId::new(format!("player-{}", i)))
}

fn entries_strategy() -> impl Strategy<Value = Vec<(AccountId, Decimal)>> {
    prop::collection::vec((player_strategy(), valid_amount_strategy()), 1..40)
}

fn engine_with(seed: u64) -> (LotteryEngine, Arc<InMemoryAccounts>) {
    let accounts = Arc::new(InMemoryAccounts::new());
    let engine = LotteryEngine::open(
        manager(),
        minimum(),
        Box::new(SeededRandom::new(seed)),
        accounts.clone(),
        None,
    )
    .unwrap();
    (engine, accounts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: roster preserves acceptance order, including repeats
    #[test]
    fn prop_roster_preserves_order(entries in entries_strategy()) {
        let (mut engine, _) = engine_with(1);

        for (player, amount) in &entries {
            engine.enter(player.clone(), *amount).unwrap();
        }

        let expected: Vec<AccountId> = entries.iter().map(|(p, _)| p.clone()).collect();
        prop_assert_eq!(engine.players(), expected.as_slice());
    }

    /// Property: entries below the minimum are rejected without effect
    #[test]
    fn prop_below_minimum_rejected(
        entries in entries_strategy(),
        small in small_amount_strategy(),
    ) {
        let (mut engine, _) = engine_with(2);
        for (player, amount) in &entries {
            engine.enter(player.clone(), *amount).unwrap();
        }
        let before = engine.snapshot();

        let result = engine.enter(AccountId::new("late"), small);
        let is_insufficient = matches!(result, Err(Error::InsufficientEntry { .. }));
        prop_assert!(is_insufficient);
        prop_assert_eq!(engine.snapshot(), before);
    }

    /// Property: amounts finer than the smallest unit are refused without effect
    #[test]
    fn prop_sub_unit_amounts_rejected(
        entries in entries_strategy(),
        fine in sub_unit_amount_strategy(),
    ) {
        let (mut engine, _) = engine_with(4);
        for (player, amount) in &entries {
            engine.enter(player.clone(), *amount).unwrap();
        }
        let before = engine.snapshot();

        let result = engine.enter(AccountId::new("late"), fine);
        let is_invalid = matches!(result, Err(Error::InvalidAmount(_)));
        prop_assert!(is_invalid);
        prop_assert_eq!(engine.snapshot(), before);
    }

    /// Property: full-precision entries are either credited exactly or refused
    #[test]
    fn prop_full_precision_entries_conserve_exactly(
        attos in prop::collection::vec(atto_amount_strategy(), 1..40),
    ) {
        let (mut engine, _) = engine_with(5);
        let mut accepted_atto: i128 = 0;

        for (i, atto) in attos.iter().enumerate() {
            let amount = Decimal::from_i128_with_scale(*atto, 18);
            let before = engine.snapshot();

            match engine.enter(AccountId::new(format!("player-{}", i % 6)), amount) {
                Ok(()) => accepted_atto += *atto,
                Err(Error::InvariantViolation(_)) => {
                    prop_assert_eq!(engine.snapshot(), before);
                }
                Err(e) => {
                    prop_assert!(false, "unexpected error: {}", e);
                }
            }

            let pool = engine.pool_balance();
            let pool_atto = pool.mantissa() * 10i128.pow(18 - pool.scale());
            prop_assert_eq!(pool_atto, accepted_atto);
        }
    }

    /// Property: any caller other than the manager cannot settle
    #[test]
    fn prop_only_manager_settles(
        entries in entries_strategy(),
        caller in player_strategy(),
    ) {
        let (mut engine, accounts) = engine_with(3);
        for (player, amount) in &entries {
            engine.enter(player.clone(), *amount).unwrap();
        }
        let before = engine.snapshot();

        let result = engine.pick_winner(&caller);
        let is_unauthorized = matches!(result, Err(Error::Unauthorized { .. }));
        prop_assert!(is_unauthorized);
        prop_assert_eq!(engine.snapshot(), before);
        prop_assert_eq!(accounts.transfer_count(), 0);
    }

    /// Property: settlement pays the whole pool to an entrant and resets both fields
    #[test]
    fn prop_settlement_atomic_and_conserving(
        entries in entries_strategy(),
        seed in any::<u64>(),
    ) {
        let (mut engine, accounts) = engine_with(seed);
        let mut expected_pool = Decimal::ZERO;
        for (player, amount) in &entries {
            engine.enter(player.clone(), *amount).unwrap();
            expected_pool += *amount;
            prop_assert_eq!(engine.pool_balance(), expected_pool);
        }

        let roster = engine.players().to_vec();
        let receipt = engine.pick_winner(&manager()).unwrap();

        prop_assert!(receipt.winner_index < roster.len());
        prop_assert_eq!(&roster[receipt.winner_index], &receipt.winner);
        prop_assert_eq!(receipt.amount, expected_pool);
        prop_assert_eq!(receipt.entrant_count, roster.len());
        prop_assert_eq!(accounts.balance_of(&receipt.winner), expected_pool);
        prop_assert_eq!(accounts.transfer_count(), 1);

        prop_assert!(engine.players().is_empty());
        prop_assert_eq!(engine.pool_balance(), Decimal::ZERO);
    }

    /// Property: across rounds, total paid out equals total accepted
    #[test]
    fn prop_conservation_across_rounds(
        rounds in prop::collection::vec(entries_strategy(), 1..5),
        seed in any::<u64>(),
    ) {
        let (mut engine, accounts) = engine_with(seed);
        let mut accepted = Decimal::ZERO;

        for entries in &rounds {
            for (player, amount) in entries {
                engine.enter(player.clone(), *amount).unwrap();
                accepted += *amount;
            }
            engine.pick_winner(&manager()).unwrap();
        }

        let paid: Decimal = (0u8..6)
            .map(|i| accounts.balance_of(&AccountId::new(format!("player-{}", i))))
            .sum();
        prop_assert_eq!(paid, accepted);
        prop_assert_eq!(engine.round(), rounds.len() as u64);
    }

    /// Property: readers through the actor never see roster and pool out of sync
    #[test]
    fn prop_snapshots_consistent_through_actor(entries in entries_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = LotteryLedger::open_with_random(
                Config::default(),
                manager(),
                Arc::new(InMemoryAccounts::new()),
                Box::new(FixedIndex(0)),
            )
            .await
            .unwrap();

            let handle = ledger.handle();
            let reader = tokio::spawn(async move {
                let mut observed = Vec::new();
                for _ in 0..20 {
                    observed.push(handle.snapshot().await.unwrap());
                    tokio::task::yield_now().await;
                }
                observed
            });

            for (player, amount) in &entries {
                ledger.enter(player.clone(), *amount).await.unwrap();
            }
            ledger.pick_winner(manager()).await.unwrap();

            for snapshot in reader.await.unwrap() {
                prop_assert_eq!(snapshot.players.is_empty(), snapshot.pool_balance == Decimal::ZERO);
            }

            let after = ledger.snapshot().await.unwrap();
            prop_assert!(after.players.is_empty());
            prop_assert_eq!(after.pool_balance, Decimal::ZERO);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}
