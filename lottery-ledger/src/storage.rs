//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - Current ledger state (single key)
//! - `settlements` - Settlement receipts (key: round, big-endian)

use crate::{
    config::StorageConfig,
    error::{Error, Result},
    types::{LedgerState, SettlementReceipt},
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_STATE: &str = "state";
const CF_SETTLEMENTS: &str = "settlements";

/// Key of the ledger state record
const STATE_KEY: &[u8] = b"ledger";

/// Durable home of the ledger state and its settlement receipts
///
/// Writes either land completely or return an error and leave the stored
/// copy as it was.
pub trait LedgerStore: Send + Sync {
    /// Load ledger state, if one was ever written
    fn load_state(&self) -> Result<Option<LedgerState>>;

    /// Overwrite ledger state
    fn put_state(&self, state: &LedgerState) -> Result<()>;

    /// Write the reset state and its settlement receipt together
    fn commit_settlement(&self, state: &LedgerState, receipt: &SettlementReceipt) -> Result<()>;

    /// Get settlement receipt by round
    fn get_settlement(&self, round: u64) -> Result<SettlementReceipt>;

    /// Get the most recent settlement receipt
    fn latest_settlement(&self) -> Result<Option<SettlementReceipt>>;
}

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);

        if config.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_SETTLEMENTS, Self::cf_options_settlements()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB for lottery ledger");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is rewritten on every transition, favour speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_settlements() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }
}

impl LedgerStore for Storage {
    // State operations

    /// Load ledger state, if one was ever written
    fn load_state(&self) -> Result<Option<LedgerState>> {
        let cf = self.cf_handle(CF_STATE)?;

        match self.db.get_cf(cf, STATE_KEY)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite ledger state
    fn put_state(&self, state: &LedgerState) -> Result<()> {
        let cf = self.cf_handle(CF_STATE)?;
        let value = bincode::serialize(state)?;

        self.db.put_cf(cf, STATE_KEY, &value)?;

        tracing::debug!(
            round = state.round,
            roster_size = state.players.len(),
            pool_balance = %state.pool_balance,
            "Ledger state persisted"
        );

        Ok(())
    }

    // Settlement operations

    /// Single `WriteBatch`, so both records become visible at once
    fn commit_settlement(&self, state: &LedgerState, receipt: &SettlementReceipt) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_state = self.cf_handle(CF_STATE)?;
        batch.put_cf(cf_state, STATE_KEY, bincode::serialize(state)?);

        let cf_settlements = self.cf_handle(CF_SETTLEMENTS)?;
        batch.put_cf(
            cf_settlements,
            receipt.round.to_be_bytes(),
            bincode::serialize(receipt)?,
        );

        self.db.write(batch)?;

        tracing::debug!(
            round = receipt.round,
            settlement_id = %receipt.settlement_id,
            "Settlement committed"
        );

        Ok(())
    }

    /// Get settlement receipt by round
    fn get_settlement(&self, round: u64) -> Result<SettlementReceipt> {
        let cf = self.cf_handle(CF_SETTLEMENTS)?;

        let value = self
            .db
            .get_cf(cf, round.to_be_bytes())?
            .ok_or(Error::SettlementNotFound(round))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// Get the most recent settlement receipt
    fn latest_settlement(&self) -> Result<Option<SettlementReceipt>> {
        let cf = self.cf_handle(CF_SETTLEMENTS)?;

        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (_, value) = item?;
                Ok(Some(bincode::deserialize(&value)?))
            }
            None => Ok(None),
        }
    }
}
