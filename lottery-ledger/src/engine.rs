//! Lottery state machine
//!
//! [`LotteryEngine`] owns the manager, the entrant roster and the pool
//! balance. Every method runs to completion on `&mut self`, so whoever owns
//! the engine (the actor in [`crate::actor`]) decides the order of
//! transitions.
//!
//! # Invariants
//!
//! - Pool balance equals the sum of entries accepted since the last settlement
//! - Roster is empty after every settlement
//! - Manager never changes after creation
//! - Every roster entry was accepted at or above the minimum entry
//!
//! A failed call leaves memory and storage exactly as they were.

use crate::{
    config::UNIT_SCALE,
    metrics::Metrics,
    random::RandomSource,
    storage::LedgerStore,
    transfer::ValueTransfer,
    types::{AccountId, LedgerState, SettlementReceipt, TransferReceipt},
    Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// The lottery state machine
pub struct LotteryEngine {
    /// Committed state
    state: LedgerState,

    /// Smallest accepted entry
    minimum_entry: Decimal,

    /// Winner draw
    random: Box<dyn RandomSource>,

    /// Payout capability
    transfer: Arc<dyn ValueTransfer>,

    /// Durable copy of `state` (memory-only when absent)
    storage: Option<Arc<dyn LedgerStore>>,

    /// Receipt of the most recent settlement
    last_settlement: Option<SettlementReceipt>,

    metrics: Metrics,
}

impl std::fmt::Debug for LotteryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LotteryEngine")
            .field("state", &self.state)
            .field("minimum_entry", &self.minimum_entry)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl LotteryEngine {
    /// Create or restore the ledger deployed by `deployer`
    ///
    /// With storage, a previously persisted ledger is restored and must
    /// belong to the same manager. Otherwise a fresh ledger is created.
    pub fn open(
        deployer: AccountId,
        minimum_entry: Decimal,
        random: Box<dyn RandomSource>,
        transfer: Arc<dyn ValueTransfer>,
        storage: Option<Arc<dyn LedgerStore>>,
    ) -> Result<Self> {
        if minimum_entry.is_sign_negative() {
            return Err(Error::Config(format!(
                "minimum entry must not be negative, got {}",
                minimum_entry
            )));
        }

        let (state, last_settlement) = match &storage {
            Some(storage) => match storage.load_state()? {
                Some(state) => {
                    if state.manager != deployer {
                        return Err(Error::AuthorityMismatch {
                            stored: state.manager,
                            requested: deployer,
                        });
                    }
                    tracing::info!(
                        manager = %state.manager,
                        round = state.round,
                        roster_size = state.players.len(),
                        pool_balance = %state.pool_balance,
                        "Restored lottery ledger"
                    );
                    (state, storage.latest_settlement()?)
                }
                None => {
                    let state = LedgerState::new(deployer);
                    storage.put_state(&state)?;
                    tracing::info!(manager = %state.manager, "Created persistent lottery ledger");
                    (state, None)
                }
            },
            None => {
                tracing::info!(manager = %deployer, "Created in-memory lottery ledger");
                (LedgerState::new(deployer), None)
            }
        };

        let metrics = Metrics::new()?;
        metrics.update_round(state.players.len(), state.pool_balance);

        Ok(Self {
            state,
            minimum_entry,
            random,
            transfer,
            storage,
            last_settlement,
            metrics,
        })
    }

    /// Enter the current round with `amount`
    pub fn enter(&mut self, caller: AccountId, amount: Decimal) -> Result<()> {
        match self.try_enter(caller, amount) {
            Ok(()) => {
                self.metrics
                    .record_entry(self.state.player_count(), self.state.pool_balance);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_entry_rejected();
                tracing::warn!(amount = %amount, error = %e, "Entry rejected");
                Err(e)
            }
        }
    }

    fn try_enter(&mut self, caller: AccountId, amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() {
            return Err(Error::InvalidAmount(format!(
                "entry amount must not be negative, got {}",
                amount
            )));
        }

        if amount.normalize().scale() > UNIT_SCALE {
            return Err(Error::InvalidAmount(format!(
                "entry amount {} is finer than 1e-{} units",
                amount, UNIT_SCALE
            )));
        }

        if amount < self.minimum_entry {
            return Err(Error::InsufficientEntry {
                amount,
                minimum: self.minimum_entry,
            });
        }

        let previous_balance = self.state.pool_balance;
        let credited = previous_balance.checked_add(amount).ok_or_else(|| {
            Error::InvariantViolation(format!("pool balance overflow adding {}", amount))
        })?;

        // Decimal rounds instead of failing once the mantissa is exhausted
        if credited - previous_balance != amount {
            return Err(Error::InvariantViolation(format!(
                "pool balance {} cannot hold {} exactly",
                previous_balance, amount
            )));
        }

        let entrant = caller.clone();
        self.state.players.push(caller);
        self.state.pool_balance = credited;

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.put_state(&self.state) {
                self.state.players.pop();
                self.state.pool_balance = previous_balance;
                return Err(e);
            }
        }

        tracing::info!(
            caller = %entrant,
            amount = %amount,
            roster_size = self.state.player_count(),
            pool_balance = %self.state.pool_balance,
            "Player entered"
        );

        Ok(())
    }

    /// Pay the whole pool to a randomly drawn entrant and start a new round
    ///
    /// Only the manager may settle. The payout, the persisted reset and the
    /// in-memory reset happen together or not at all.
    pub fn pick_winner(&mut self, caller: &AccountId) -> Result<SettlementReceipt> {
        let started = Instant::now();

        match self.settle(caller) {
            Ok(receipt) => {
                self.metrics
                    .record_settlement(started.elapsed().as_secs_f64());
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.record_settlement_rejected();
                tracing::warn!(caller = %caller, error = %e, "Settlement rejected");
                Err(e)
            }
        }
    }

    fn settle(&mut self, caller: &AccountId) -> Result<SettlementReceipt> {
        if *caller != self.state.manager {
            return Err(Error::Unauthorized {
                caller: caller.clone(),
            });
        }

        let entrant_count = self.state.players.len();
        if entrant_count == 0 {
            return Err(Error::EmptyRoster);
        }

        let winner_index = self.random.next_index(entrant_count);
        let winner = self
            .state
            .players
            .get(winner_index)
            .cloned()
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "random source returned index {} for {} entrants",
                    winner_index, entrant_count
                ))
            })?;

        let amount = self.state.pool_balance;
        let next = self.state.settled();

        let transfer = self.transfer.transfer(&winner, amount)?;

        let receipt = SettlementReceipt {
            settlement_id: Uuid::now_v7(),
            round: self.state.round,
            winner,
            winner_index,
            amount,
            entrant_count,
            transfer_reference: transfer.reference.clone(),
            settled_at: Utc::now(),
        };

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.commit_settlement(&next, &receipt) {
                return Err(self.compensate(&transfer, e));
            }
        }

        self.state = next;
        self.last_settlement = Some(receipt.clone());

        if let Err(e) = self.transfer.confirm(&transfer) {
            tracing::warn!(
                reference = %transfer.reference,
                error = %e,
                "Payout committed but not confirmed"
            );
        }

        tracing::info!(
            round = receipt.round,
            winner = %receipt.winner,
            winner_index = receipt.winner_index,
            amount = %receipt.amount,
            entrant_count = receipt.entrant_count,
            "Winner paid, new round started"
        );

        Ok(receipt)
    }

    /// Undo a payout whose settlement could not be committed
    ///
    /// Returns the error to report: the commit failure, or an invariant
    /// violation when the payout could not be reversed either.
    fn compensate(&self, transfer: &TransferReceipt, cause: Error) -> Error {
        tracing::error!(
            reference = %transfer.reference,
            error = %cause,
            "Settlement commit failed, reversing payout"
        );

        match self.transfer.reverse(transfer) {
            Ok(()) => cause,
            Err(reverse_err) => {
                tracing::error!(
                    reference = %transfer.reference,
                    to = %transfer.to,
                    amount = %transfer.amount,
                    error = %reverse_err,
                    "Payout reversal failed"
                );
                Error::InvariantViolation(format!(
                    "payout {} of {} to {} executed but settlement not committed ({}); reversal failed: {}",
                    transfer.reference, transfer.amount, transfer.to, cause, reverse_err
                ))
            }
        }
    }

    /// Manager fixed at creation
    pub fn manager(&self) -> &AccountId {
        &self.state.manager
    }

    /// Entrants of the current round, in acceptance order
    pub fn players(&self) -> &[AccountId] {
        &self.state.players
    }

    /// Pool awaiting payout
    pub fn pool_balance(&self) -> Decimal {
        self.state.pool_balance
    }

    /// Completed settlements
    pub fn round(&self) -> u64 {
        self.state.round
    }

    /// Smallest accepted entry
    pub fn minimum_entry(&self) -> Decimal {
        self.minimum_entry
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> LedgerState {
        self.state.clone()
    }

    /// Receipt of the most recent settlement
    pub fn last_settlement(&self) -> Option<&SettlementReceipt> {
        self.last_settlement.as_ref()
    }

    /// Receipt of the settlement that closed `round`
    pub fn settlement(&self, round: u64) -> Result<SettlementReceipt> {
        if let Some(receipt) = self.last_settlement.as_ref().filter(|r| r.round == round) {
            return Ok(receipt.clone());
        }

        match &self.storage {
            Some(storage) => storage.get_settlement(round),
            None => Err(Error::SettlementNotFound(round)),
        }
    }

    /// Metrics collector of this engine
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
