//! Main ledger orchestration layer
//!
//! This module ties together configuration, storage, the injected
//! capabilities and the actor into the public lottery API.
//!
//! # Example
//!
//! ```no_run
//! use lottery_ledger::{AccountId, Config, InMemoryAccounts, LotteryLedger};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> lottery_ledger::Result<()> {
//!     let accounts = Arc::new(InMemoryAccounts::new());
//!     let ledger = LotteryLedger::open(Config::default(), AccountId::new("manager"), accounts).await?;
//!
//!     ledger.enter(AccountId::new("player"), Decimal::new(11, 3)).await?;
//!     let receipt = ledger.pick_winner(AccountId::new("manager")).await?;
//!     assert_eq!(receipt.winner, AccountId::new("player"));
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    engine::LotteryEngine,
    random::{self, RandomSource},
    storage::{LedgerStore, Storage},
    transfer::ValueTransfer,
    types::{AccountId, LedgerState, SettlementReceipt},
    Config, Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Main ledger interface
#[derive(Debug)]
pub struct LotteryLedger {
    /// Actor handle for all operations
    handle: LedgerHandle,

    /// Actor task
    task: JoinHandle<()>,

    /// Manager, immutable after creation
    manager: AccountId,

    /// Configuration
    config: Config,
}

impl LotteryLedger {
    /// Open the ledger deployed by `deployer`
    ///
    /// The winner draw uses `config.lottery.random_seed` when set and OS
    /// randomness otherwise.
    pub async fn open(
        config: Config,
        deployer: AccountId,
        transfer: Arc<dyn ValueTransfer>,
    ) -> Result<Self> {
        let random = random::from_seed(config.lottery.random_seed);
        Self::open_with_random(config, deployer, transfer, random).await
    }

    /// Open the ledger with an explicit random source
    pub async fn open_with_random(
        config: Config,
        deployer: AccountId,
        transfer: Arc<dyn ValueTransfer>,
        random: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;

        let storage = if config.storage.enabled {
            Some(Arc::new(Storage::open(&config.storage)?) as Arc<dyn LedgerStore>)
        } else {
            None
        };

        let engine = LotteryEngine::open(
            deployer,
            config.lottery.minimum_entry,
            random,
            transfer,
            storage,
        )?;
        let manager = engine.manager().clone();

        let (handle, task) = spawn_ledger_actor(engine, config.mailbox_capacity);

        tracing::info!(
            service = %config.service_name,
            manager = %manager,
            minimum_entry = %config.lottery.minimum_entry,
            persistent = config.storage.enabled,
            "Lottery ledger opened"
        );

        Ok(Self {
            handle,
            task,
            manager,
            config,
        })
    }

    /// Enter the current round with `amount` attached
    pub async fn enter(&self, caller: AccountId, amount: Decimal) -> Result<()> {
        self.handle.enter(caller, amount).await
    }

    /// Entrants of the current round, in acceptance order
    pub async fn players(&self) -> Result<Vec<AccountId>> {
        self.handle.players().await
    }

    /// Manager of this ledger
    pub fn manager(&self) -> &AccountId {
        &self.manager
    }

    /// Pay the pool to a randomly drawn entrant (manager only)
    pub async fn pick_winner(&self, caller: AccountId) -> Result<SettlementReceipt> {
        self.handle.pick_winner(caller).await
    }

    /// Pool awaiting payout
    pub async fn pool_balance(&self) -> Result<Decimal> {
        self.handle.pool_balance().await
    }

    /// Consistent copy of manager, roster, pool and round
    pub async fn snapshot(&self) -> Result<LedgerState> {
        self.handle.snapshot().await
    }

    /// Receipt of the most recent settlement
    pub async fn last_settlement(&self) -> Result<Option<SettlementReceipt>> {
        self.handle.last_settlement().await
    }

    /// Receipt of the settlement that closed `round`
    pub async fn settlement(&self, round: u64) -> Result<SettlementReceipt> {
        self.handle.settlement(round).await
    }

    /// Prometheus text exposition of the ledger metrics
    pub async fn gather_metrics(&self) -> Result<String> {
        self.handle.gather_metrics().await
    }

    /// Smallest accepted entry
    pub fn minimum_entry(&self) -> Decimal {
        self.config.lottery.minimum_entry
    }

    /// Cloneable handle for concurrent callers
    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Configuration the ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger and wait for the actor to release its state
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.task
            .await
            .map_err(|e| Error::Concurrency(format!("Actor task failed: {}", e)))
    }
}
