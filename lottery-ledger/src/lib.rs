//! Lottery Ledger
//!
//! Custodies a pool of entries and pays it out to a randomly drawn entrant
//! on the manager's command.
//!
//! # Architecture
//!
//! - **State Machine**: [`engine::LotteryEngine`] owns manager, roster and pool
//! - **Single Writer**: One actor task serializes every transition
//! - **Injected Capabilities**: Randomness and value transfer are pluggable
//! - **Optional Durability**: RocksDB keeps state and settlement receipts
//!
//! # Invariants
//!
//! - Money conservation: pool == Σ(accepted entries) since the last settlement
//! - Atomic settlement: payout, roster reset and pool reset commit together
//! - Fixed authority: the manager never changes after creation
//! - Threshold: every entrant paid at least the minimum entry

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod storage;
pub mod engine;
pub mod ledger;
pub mod random;
pub mod transfer;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{AccountId, LedgerState, SettlementReceipt, TransferReceipt};
pub use engine::LotteryEngine;
pub use ledger::LotteryLedger;
pub use random::{FixedIndex, OsRandom, RandomSource, SeededRandom};
pub use storage::{LedgerStore, Storage};
pub use transfer::{InMemoryAccounts, ValueTransfer};
pub use config::Config;
