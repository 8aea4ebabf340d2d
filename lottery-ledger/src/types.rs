//! Core types for the lottery ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a caller (account address, user handle, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Complete ledger state between two transitions
///
/// This is the unit persisted to storage and handed out by snapshot reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Manager fixed at creation
    pub manager: AccountId,

    /// Entrants of the current round, in acceptance order
    pub players: Vec<AccountId>,

    /// Sum of accepted entries since the last settlement
    pub pool_balance: Decimal,

    /// Number of completed settlements
    pub round: u64,
}

impl LedgerState {
    /// Fresh state for a newly created ledger
    pub fn new(manager: AccountId) -> Self {
        Self {
            manager,
            players: Vec::new(),
            pool_balance: Decimal::ZERO,
            round: 0,
        }
    }

    /// State after a settlement: same manager, empty roster, zero pool
    pub fn settled(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            players: Vec::new(),
            pool_balance: Decimal::ZERO,
            round: self.round + 1,
        }
    }

    /// Number of entries in the roster (duplicates counted)
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Proof of an executed value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Reference assigned by the transfer capability
    pub reference: String,

    /// Recipient
    pub to: AccountId,

    /// Amount moved
    pub amount: Decimal,

    /// When the transfer executed
    pub executed_at: DateTime<Utc>,
}

/// Outcome of a successful settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Unique settlement ID (UUIDv7 for time-ordering)
    pub settlement_id: Uuid,

    /// Round this settlement closed (0-based)
    pub round: u64,

    /// Entrant that received the pool
    pub winner: AccountId,

    /// Roster index drawn by the random source
    pub winner_index: usize,

    /// Pool paid out
    pub amount: Decimal,

    /// Roster size at settlement time
    pub entrant_count: usize,

    /// Reference of the payout transfer
    pub transfer_reference: String,

    /// Settlement timestamp
    pub settled_at: DateTime<Utc>,
}
