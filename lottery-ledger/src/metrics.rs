//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the lottery ledger.
//!
//! # Metrics
//!
//! - `lottery_entries_total` - Accepted entries
//! - `lottery_entries_rejected_total` - Rejected entries
//! - `lottery_settlements_total` - Completed settlements
//! - `lottery_settlements_rejected_total` - Rejected or failed settlements
//! - `lottery_roster_size` - Entrants in the current round
//! - `lottery_pool_balance` - Pool awaiting payout
//! - `lottery_settlement_duration_seconds` - Histogram of settlement latencies

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so several ledgers can live in one process.
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Accepted entries
    pub entries_total: IntCounter,

    /// Rejected entries
    pub entries_rejected: IntCounter,

    /// Completed settlements
    pub settlements_total: IntCounter,

    /// Rejected or failed settlements
    pub settlements_rejected: IntCounter,

    /// Current roster size
    pub roster_size: IntGauge,

    /// Current pool balance
    pub pool_balance: Gauge,

    /// Settlement duration histogram
    pub settlement_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let entries_total = IntCounter::new("lottery_entries_total", "Accepted entries")?;
        registry.register(Box::new(entries_total.clone()))?;

        let entries_rejected =
            IntCounter::new("lottery_entries_rejected_total", "Rejected entries")?;
        registry.register(Box::new(entries_rejected.clone()))?;

        let settlements_total =
            IntCounter::new("lottery_settlements_total", "Completed settlements")?;
        registry.register(Box::new(settlements_total.clone()))?;

        let settlements_rejected = IntCounter::new(
            "lottery_settlements_rejected_total",
            "Rejected or failed settlements",
        )?;
        registry.register(Box::new(settlements_rejected.clone()))?;

        let roster_size = IntGauge::new("lottery_roster_size", "Entrants in the current round")?;
        registry.register(Box::new(roster_size.clone()))?;

        let pool_balance = Gauge::new("lottery_pool_balance", "Pool awaiting payout")?;
        registry.register(Box::new(pool_balance.clone()))?;

        let settlement_duration = Histogram::with_opts(
            HistogramOpts::new(
                "lottery_settlement_duration_seconds",
                "Histogram of settlement latencies",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250]),
        )?;
        registry.register(Box::new(settlement_duration.clone()))?;

        Ok(Self {
            entries_total,
            entries_rejected,
            settlements_total,
            settlements_rejected,
            roster_size,
            pool_balance,
            settlement_duration,
            registry,
        })
    }

    /// Record an accepted entry
    pub fn record_entry(&self, roster_size: usize, pool_balance: Decimal) {
        self.entries_total.inc();
        self.update_round(roster_size, pool_balance);
    }

    /// Record a rejected entry
    pub fn record_entry_rejected(&self) {
        self.entries_rejected.inc();
    }

    /// Record a completed settlement
    pub fn record_settlement(&self, duration_seconds: f64) {
        self.settlements_total.inc();
        self.settlement_duration.observe(duration_seconds);
        self.update_round(0, Decimal::ZERO);
    }

    /// Record a rejected or failed settlement
    pub fn record_settlement_rejected(&self) {
        self.settlements_rejected.inc();
    }

    /// Update roster and pool gauges
    pub fn update_round(&self, roster_size: usize, pool_balance: Decimal) {
        self.roster_size.set(roster_size as i64);
        self.pool_balance.set(pool_balance.to_f64().unwrap_or(f64::MAX));
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
