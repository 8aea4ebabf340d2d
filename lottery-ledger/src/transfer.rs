//! Value transfer capability used to pay out the pool
//!
//! The ledger custodies the pool but does not move value itself. A
//! settlement calls [`ValueTransfer::transfer`] exactly once and, if the
//! state reset cannot be committed afterwards, undoes it with
//! [`ValueTransfer::reverse`]. Once the reset is committed the payout is
//! final and [`ValueTransfer::confirm`] lets the capability forget it.

use crate::types::{AccountId, TransferReceipt};
use crate::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Moves value out of the ledger to an identity
pub trait ValueTransfer: Send + Sync {
    /// Pay `amount` to `to`
    fn transfer(&self, to: &AccountId, amount: Decimal) -> Result<TransferReceipt>;

    /// Compensate a previously executed transfer
    fn reverse(&self, receipt: &TransferReceipt) -> Result<()>;

    /// Mark a transfer final; it can no longer be reversed
    fn confirm(&self, _receipt: &TransferReceipt) -> Result<()> {
        Ok(())
    }
}

/// In-process account book
///
/// Credits winners and keeps each transfer until it is confirmed or
/// reversed. Confirmed transfers are only counted.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    balances: DashMap<AccountId, Decimal>,
    pending: DashMap<String, TransferReceipt>,
    confirmed: AtomicUsize,
}

impl InMemoryAccounts {
    /// Empty account book
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance credited to an identity so far
    pub fn balance_of(&self, account: &AccountId) -> Decimal {
        self.balances
            .get(account)
            .map(|balance| *balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of transfers that are executed and not reversed
    pub fn transfer_count(&self) -> usize {
        self.pending.len() + self.confirmed.load(Ordering::Acquire)
    }

    /// Transfers still awaiting confirmation or reversal
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl ValueTransfer for InMemoryAccounts {
    fn transfer(&self, to: &AccountId, amount: Decimal) -> Result<TransferReceipt> {
        if amount.is_sign_negative() {
            return Err(Error::TransferFailed(format!(
                "cannot transfer negative amount {}",
                amount
            )));
        }

        let mut balance = self.balances.entry(to.clone()).or_insert(Decimal::ZERO);
        let credited = balance
            .checked_add(amount)
            .ok_or_else(|| Error::TransferFailed(format!("balance overflow for {}", to)))?;
        *balance = credited;
        drop(balance);

        let receipt = TransferReceipt {
            reference: format!("XFER-{}", Uuid::new_v4()),
            to: to.clone(),
            amount,
            executed_at: Utc::now(),
        };
        self.pending
            .insert(receipt.reference.clone(), receipt.clone());

        tracing::debug!(
            reference = %receipt.reference,
            to = %to,
            amount = %amount,
            "Transfer executed"
        );

        Ok(receipt)
    }

    fn reverse(&self, receipt: &TransferReceipt) -> Result<()> {
        let (_, original) = self.pending.remove(&receipt.reference).ok_or_else(|| {
            Error::TransferFailed(format!("unknown transfer {}", receipt.reference))
        })?;

        if let Some(mut balance) = self.balances.get_mut(&original.to) {
            *balance -= original.amount;
        }

        tracing::warn!(
            reference = %original.reference,
            to = %original.to,
            amount = %original.amount,
            "Transfer reversed"
        );

        Ok(())
    }

    fn confirm(&self, receipt: &TransferReceipt) -> Result<()> {
        self.pending.remove(&receipt.reference).ok_or_else(|| {
            Error::TransferFailed(format!("unknown transfer {}", receipt.reference))
        })?;
        self.confirmed.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
