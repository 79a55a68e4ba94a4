//! Ledger service - read access to transaction history

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{AccountId, Transaction, TransactionId};
use crate::ports::LedgerStore;

/// Default page size for [`LedgerService::recent`]
pub const DEFAULT_RECENT_LIMIT: usize = 20;

pub struct LedgerService<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn get_transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.store.get_transaction(id)
    }

    /// Full history of an account in append order
    ///
    /// Fails with `NotFound` for unknown accounts rather than returning an
    /// empty history.
    pub fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        self.store.get_account(account)?;
        self.store.list_for_account(account)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<Transaction>> {
        self.store.list_recent(limit)
    }
}
