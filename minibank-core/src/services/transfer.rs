//! Transfer service - peer-to-peer money movement
//!
//! One transfer is one atomic scope: both balances are read, checked and
//! written, and the ledger entry appended, before a single commit. Any
//! failure in between drops the scope, which rolls everything back.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::retry::{retry_on_conflict, DEFAULT_MAX_CONFLICT_RETRIES};
use crate::domain::money::{checked_add, checked_sub, validate_amount};
use crate::domain::result::{Error, Result};
use crate::domain::{AccountId, NewTransaction, TransactionId};
use crate::ports::{LedgerStore, Scope};

/// Progress of a single transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Initiated,
    Validated,
    BalancesRead,
    BalancesMutated,
    LedgerAppended,
    Committed,
    RolledBack,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Initiated => "initiated",
            TransferStage::Validated => "validated",
            TransferStage::BalancesRead => "balances_read",
            TransferStage::BalancesMutated => "balances_mutated",
            TransferStage::LedgerAppended => "ledger_appended",
            TransferStage::Committed => "committed",
            TransferStage::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Service moving money between two accounts
pub struct TransferService<S> {
    store: Arc<S>,
    max_conflict_retries: u32,
}

impl<S: LedgerStore> TransferService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Set how many times a conflicting transfer is restarted
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Move `amount` from one account to another
    ///
    /// Returns the id of the `Transfer` ledger entry. On any error both
    /// balances and the ledger are exactly as they were before the call.
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> Result<TransactionId> {
        let mut stage = TransferStage::Initiated;
        self.run(from, to, amount, &mut stage)
    }

    /// Leaves `stage` at `Committed`, at `RolledBack` once an attempt
    /// failed, or at `Initiated` when the request never got a scope
    fn run(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        stage: &mut TransferStage,
    ) -> Result<TransactionId> {
        validate_amount(amount)?;
        if from == to {
            return Err(Error::invalid_amount(format!(
                "account {} cannot transfer to itself",
                from
            )));
        }

        retry_on_conflict("transfer", self.max_conflict_retries, || {
            *stage = TransferStage::Validated;
            match self.attempt(from, to, amount, stage) {
                Ok(id) => {
                    tracing::debug!(%from, %to, transaction = %id, "transfer committed");
                    Ok(id)
                }
                Err(e) => {
                    tracing::warn!(%from, %to, failed_after = %stage, error = %e, "transfer rolled back");
                    *stage = TransferStage::RolledBack;
                    Err(e)
                }
            }
        })
    }

    fn attempt(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        stage: &mut TransferStage,
    ) -> Result<TransactionId> {
        let mut scope = self.store.begin()?;

        let sender = self.store.get_account_for_update(&mut scope, from)?;
        let receiver = self.store.get_account_for_update(&mut scope, to)?;
        *stage = TransferStage::BalancesRead;

        if sender.balance < amount {
            if let Err(e) = scope.rollback() {
                tracing::warn!(%from, error = %e, "rollback of refused transfer failed");
            }
            return Err(Error::InsufficientFunds {
                available: sender.balance,
                requested: amount,
            });
        }

        let sender_balance = checked_sub(sender.balance, amount)?;
        let receiver_balance = checked_add(receiver.balance, amount)?;
        self.store.set_balance(&mut scope, from, sender_balance)?;
        self.store.set_balance(&mut scope, to, receiver_balance)?;
        *stage = TransferStage::BalancesMutated;

        let id = self
            .store
            .append(&mut scope, NewTransaction::transfer(from, to, amount))?;
        *stage = TransferStage::LedgerAppended;

        scope.commit()?;
        *stage = TransferStage::Committed;
        Ok(id)
    }
}
