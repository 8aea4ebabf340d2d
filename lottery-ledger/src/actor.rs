//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`LotteryEngine`], so transitions never interleave
//! - Reads are answered between transitions and never see half-applied state
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Callers (scripts, services, tests)         │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   LotteryEngine: enter / pick_winner / reads          │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::engine::LotteryEngine;
use crate::types::{AccountId, LedgerState, SettlementReceipt};
use crate::{Error, Result};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Enter the current round
    Enter {
        caller: AccountId,
        amount: Decimal,
        response: oneshot::Sender<Result<()>>,
    },

    /// Settle the current round
    PickWinner {
        caller: AccountId,
        response: oneshot::Sender<Result<SettlementReceipt>>,
    },

    /// Get entrants of the current round
    GetPlayers {
        response: oneshot::Sender<Vec<AccountId>>,
    },

    /// Get manager
    GetManager {
        response: oneshot::Sender<AccountId>,
    },

    /// Get pool balance
    GetPoolBalance {
        response: oneshot::Sender<Decimal>,
    },

    /// Get full state copy
    GetSnapshot {
        response: oneshot::Sender<LedgerState>,
    },

    /// Get most recent settlement
    GetLastSettlement {
        response: oneshot::Sender<Option<SettlementReceipt>>,
    },

    /// Get settlement by round
    GetSettlement {
        round: u64,
        response: oneshot::Sender<Result<SettlementReceipt>>,
    },

    /// Render metrics text
    GatherMetrics {
        response: oneshot::Sender<Result<String>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// State machine, owned exclusively by this task
    engine: LotteryEngine,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(engine: LotteryEngine, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { engine, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::info!(round = self.engine.round(), "Lottery ledger actor stopping");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    ///
    /// A dropped response receiver only means the caller stopped waiting;
    /// the transition has already committed or failed atomically.
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Enter {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.engine.enter(caller, amount));
            }

            LedgerMessage::PickWinner { caller, response } => {
                let _ = response.send(self.engine.pick_winner(&caller));
            }

            LedgerMessage::GetPlayers { response } => {
                let _ = response.send(self.engine.players().to_vec());
            }

            LedgerMessage::GetManager { response } => {
                let _ = response.send(self.engine.manager().clone());
            }

            LedgerMessage::GetPoolBalance { response } => {
                let _ = response.send(self.engine.pool_balance());
            }

            LedgerMessage::GetSnapshot { response } => {
                let _ = response.send(self.engine.snapshot());
            }

            LedgerMessage::GetLastSettlement { response } => {
                let _ = response.send(self.engine.last_settlement().cloned());
            }

            LedgerMessage::GetSettlement { round, response } => {
                let _ = response.send(self.engine.settlement(round));
            }

            LedgerMessage::GatherMetrics { response } => {
                let _ = response.send(self.engine.metrics().gather_text().map_err(Error::from));
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Send a request and wait for the actor's reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Enter the current round
    pub async fn enter(&self, caller: AccountId, amount: Decimal) -> Result<()> {
        self.request(|response| LedgerMessage::Enter {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Settle the current round
    pub async fn pick_winner(&self, caller: AccountId) -> Result<SettlementReceipt> {
        self.request(|response| LedgerMessage::PickWinner { caller, response })
            .await?
    }

    /// Get entrants of the current round
    pub async fn players(&self) -> Result<Vec<AccountId>> {
        self.request(|response| LedgerMessage::GetPlayers { response })
            .await
    }

    /// Get manager
    pub async fn manager(&self) -> Result<AccountId> {
        self.request(|response| LedgerMessage::GetManager { response })
            .await
    }

    /// Get pool balance
    pub async fn pool_balance(&self) -> Result<Decimal> {
        self.request(|response| LedgerMessage::GetPoolBalance { response })
            .await
    }

    /// Get full state copy
    pub async fn snapshot(&self) -> Result<LedgerState> {
        self.request(|response| LedgerMessage::GetSnapshot { response })
            .await
    }

    /// Get most recent settlement
    pub async fn last_settlement(&self) -> Result<Option<SettlementReceipt>> {
        self.request(|response| LedgerMessage::GetLastSettlement { response })
            .await
    }

    /// Get settlement by round
    pub async fn settlement(&self, round: u64) -> Result<SettlementReceipt> {
        self.request(|response| LedgerMessage::GetSettlement { round, response })
            .await?
    }

    /// Render metrics in the Prometheus text format
    pub async fn gather_metrics(&self) -> Result<String> {
        self.request(|response| LedgerMessage::GatherMetrics { response })
            .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
///
/// The returned task completes once the actor has stopped and released the
/// engine (and with it any open storage).
pub fn spawn_ledger_actor(
    engine: LotteryEngine,
    mailbox_capacity: usize,
) -> (LedgerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(engine, rx);

    let task = tokio::spawn(async move {
        actor.run().await;
    });

    (LedgerHandle::new(tx), task)
}
