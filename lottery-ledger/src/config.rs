//! Configuration for the lottery ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Decimal places of the smallest transferable unit (1e-18 of a whole unit)
///
/// Entries finer than this are refused, which keeps every accepted amount
/// exactly representable in the pool.
pub const UNIT_SCALE: u32 = 18;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// Entry and settlement rules
    pub lottery: LotteryConfig,

    /// Durable storage
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "lottery-ledger".to_string(),
            mailbox_capacity: 1000,
            lottery: LotteryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Entry and settlement rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Smallest accepted entry, in whole units
    pub minimum_entry: Decimal,

    /// Seed for a deterministic winner draw (OS randomness when unset)
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            minimum_entry: Decimal::new(1, 2), // 0.01 units
            random_seed: None,
        }
    }
}

/// RocksDB storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Persist state to RocksDB (memory-only when false)
    pub enabled: bool,

    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: PathBuf::from("./data/lottery"),
            write_buffer_size_mb: 16,
            enable_statistics: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(minimum) = std::env::var("LOTTERY_MINIMUM_ENTRY") {
            config.lottery.minimum_entry = Decimal::from_str(&minimum).map_err(|e| {
                crate::Error::Config(format!("Invalid LOTTERY_MINIMUM_ENTRY: {}", e))
            })?;
        }

        if let Ok(seed) = std::env::var("LOTTERY_RANDOM_SEED") {
            let seed = seed.parse::<u64>().map_err(|e| {
                crate::Error::Config(format!("Invalid LOTTERY_RANDOM_SEED: {}", e))
            })?;
            config.lottery.random_seed = Some(seed);
        }

        if let Ok(data_dir) = std::env::var("LOTTERY_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
            config.storage.enabled = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ledger cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.lottery.minimum_entry.is_sign_negative() {
            return Err(crate::Error::Config(format!(
                "minimum_entry must not be negative, got {}",
                self.lottery.minimum_entry
            )));
        }

        if self.lottery.minimum_entry.normalize().scale() > UNIT_SCALE {
            return Err(crate::Error::Config(format!(
                "minimum_entry {} is finer than the smallest unit",
                self.lottery.minimum_entry
            )));
        }

        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
