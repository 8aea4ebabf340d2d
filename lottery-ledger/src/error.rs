//! Error types for the lottery ledger

use crate::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every variant is reported to the caller. A failed call never leaves
/// partially applied state behind, so the ledger stays usable afterwards.
#[derive(Error, Debug)]
pub enum Error {
    /// Entry amount below the minimum threshold
    #[error("Insufficient entry: {amount} is below the minimum of {minimum}")]
    InsufficientEntry {
        /// Amount attached to the call
        amount: Decimal,
        /// Configured minimum entry
        minimum: Decimal,
    },

    /// Amount that can never be accepted (negative, malformed)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Settlement attempted by someone other than the manager
    #[error("Unauthorized: {caller} is not the manager")]
    Unauthorized {
        /// Identity that attempted the call
        caller: AccountId,
    },

    /// Settlement attempted with no entrants
    #[error("Cannot pick a winner: no players have entered")]
    EmptyRoster,

    /// Value transfer capability rejected the payout
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// No receipt persisted for the requested round
    #[error("Settlement not found for round {0}")]
    SettlementNotFound(u64),

    /// Stored ledger belongs to a different manager
    #[error("Authority mismatch: ledger is managed by {stored}, not {requested}")]
    AuthorityMismatch {
        /// Manager recorded in storage
        stored: AccountId,
        /// Deployer passed when opening
        requested: AccountId,
    },

    /// Invariant violation (balance overflow, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for rejections caused by the caller's input rather than the ledger
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InsufficientEntry { .. }
                | Error::InvalidAmount(_)
                | Error::Unauthorized { .. }
                | Error::EmptyRoster
        )
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Other(format!("metrics: {}", err))
    }
}
