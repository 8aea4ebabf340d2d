//! End-to-end lottery scenarios against the async ledger API

use lottery_ledger::{
    AccountId, Config, Error, FixedIndex, InMemoryAccounts, LotteryLedger, SettlementReceipt,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// Accounts as the deployment harness sees them; index 0 deploys
fn accounts() -> Vec<AccountId> {
    (0..3)
        .map(|i| AccountId::new(format!("0x{:040x}", i + 1)))
        .collect()
}

fn units(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// One raw unit of the smallest denomination (1e-18 of a unit)
fn one_raw_unit() -> Decimal {
    Decimal::new(1, 18)
}

async fn deploy() -> (LotteryLedger, Arc<InMemoryAccounts>, Vec<AccountId>) {
    let accounts_book = Arc::new(InMemoryAccounts::new());
    let ids = accounts();
    let ledger = LotteryLedger::open_with_random(
        Config::default(),
        ids[0].clone(),
        accounts_book.clone(),
        Box::new(FixedIndex(0)),
    )
    .await
    .unwrap();
    (ledger, accounts_book, ids)
}

#[tokio::test]
async fn deploys_with_manager() {
    let (ledger, _, ids) = deploy().await;

    assert_eq!(ledger.manager(), &ids[0]);
    assert_eq!(ledger.snapshot().await.unwrap().manager, ids[0]);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn player_can_enter() {
    let (ledger, _, ids) = deploy().await;

    ledger.enter(ids[1].clone(), units("0.011")).await.unwrap();

    let players = ledger.players().await.unwrap();
    assert_eq!(players, vec![ids[1].clone()]);
    assert_eq!(players.len(), 1);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn two_players_can_enter() {
    let (ledger, _, ids) = deploy().await;

    ledger.enter(ids[1].clone(), units("0.011")).await.unwrap();
    ledger.enter(ids[2].clone(), units("0.011")).await.unwrap();

    let players = ledger.players().await.unwrap();
    assert_eq!(players[0], ids[1]);
    assert_eq!(players[1], ids[2]);
    assert_eq!(players.len(), 2);
    assert_eq!(ledger.pool_balance().await.unwrap(), units("0.022"));

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn requires_minimum_amount_to_enter() {
    let (ledger, _, ids) = deploy().await;

    let result = ledger.enter(ids[1].clone(), one_raw_unit()).await;
    assert!(matches!(result, Err(Error::InsufficientEntry { .. })));

    assert!(ledger.players().await.unwrap().is_empty());
    assert_eq!(ledger.pool_balance().await.unwrap(), Decimal::ZERO);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn non_manager_cannot_pick_winner() {
    let (ledger, accounts_book, ids) = deploy().await;
    ledger.enter(ids[2].clone(), units("0.011")).await.unwrap();

    let result = ledger.pick_winner(ids[1].clone()).await;
    assert!(matches!(result, Err(Error::Unauthorized { .. })));

    assert_eq!(ledger.players().await.unwrap(), vec![ids[2].clone()]);
    assert_eq!(ledger.pool_balance().await.unwrap(), units("0.011"));
    assert_eq!(accounts_book.transfer_count(), 0);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn sends_money_to_winner_and_resets_players() {
    let (ledger, accounts_book, ids) = deploy().await;

    ledger.enter(ids[0].clone(), units("1")).await.unwrap();
    let initial_balance = accounts_book.balance_of(&ids[0]);

    let receipt: SettlementReceipt = ledger.pick_winner(ids[0].clone()).await.unwrap();

    let difference = accounts_book.balance_of(&ids[0]) - initial_balance;
    assert!(difference > units("0.8"));
    assert_eq!(receipt.winner, ids[0]);
    assert_eq!(receipt.amount, units("1"));

    assert!(ledger.players().await.unwrap().is_empty());
    assert_eq!(ledger.pool_balance().await.unwrap(), Decimal::ZERO);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_roster_cannot_be_settled() {
    let (ledger, accounts_book, ids) = deploy().await;

    let result = ledger.pick_winner(ids[0].clone()).await;
    assert!(matches!(result, Err(Error::EmptyRoster)));
    assert_eq!(accounts_book.transfer_count(), 0);
    assert!(ledger.last_settlement().await.unwrap().is_none());

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn seeded_draws_are_reproducible() {
    let mut config = Config::default();
    config.lottery.random_seed = Some(2024);

    let mut winners = Vec::new();
    for _ in 0..2 {
        let ids = accounts();
        let ledger = LotteryLedger::open(
            config.clone(),
            ids[0].clone(),
            Arc::new(InMemoryAccounts::new()),
        )
        .await
        .unwrap();

        for round in 0..5 {
            for id in &ids {
                ledger.enter(id.clone(), units("0.011")).await.unwrap();
            }
            let receipt = ledger.pick_winner(ids[0].clone()).await.unwrap();
            assert_eq!(receipt.round, round);
            winners.push(receipt.winner_index);
        }

        ledger.shutdown().await.unwrap();
    }

    assert_eq!(winners[..5], winners[5..]);
}
