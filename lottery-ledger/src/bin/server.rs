//! Lottery ledger server binary

use anyhow::Context;
use lottery_ledger::{AccountId, Config, InMemoryAccounts, LotteryLedger};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Lottery Ledger Server");

    // Load configuration
    let config = match std::env::var("LOTTERY_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => Config::from_env().context("loading configuration from environment")?,
    };

    let manager = std::env::var("LOTTERY_MANAGER")
        .map(AccountId::new)
        .context("LOTTERY_MANAGER must name the deploying account")?;

    // Payouts stay in process until a settlement rail is wired in
    let accounts = Arc::new(InMemoryAccounts::new());

    let ledger = LotteryLedger::open(config, manager, accounts)
        .await
        .context("opening lottery ledger")?;

    let snapshot = ledger.snapshot().await?;
    tracing::info!(
        manager = %snapshot.manager,
        round = snapshot.round,
        players = snapshot.players.len(),
        pool_balance = %snapshot.pool_balance,
        "Ledger opened successfully"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down lottery ledger server");
    ledger.shutdown().await?;
    Ok(())
}
