//! Account service - registration, lookup and closing

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountId, NewAccount};
use crate::ports::LedgerStore;

pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a new account
    pub fn open(&self, account: &NewAccount) -> Result<Account> {
        let created = self.store.create_account(account)?;
        tracing::debug!(account = %created.id, "account opened");
        Ok(created)
    }

    pub fn get(&self, id: AccountId) -> Result<Account> {
        self.store.get_account(id)
    }

    pub fn list(&self) -> Result<Vec<Account>> {
        self.store.list_accounts()
    }

    /// Resolve a payment recipient given as email or phone number
    pub fn find_recipient(&self, recipient: &str) -> Result<Account> {
        let recipient = recipient.trim();
        let found = if recipient.contains('@') {
            self.store.find_account_by_email(recipient)?
        } else {
            let number: i64 = recipient.parse().map_err(|_| {
                Error::validation(format!(
                    "recipient '{}' is neither an email nor a phone number",
                    recipient
                ))
            })?;
            self.store.find_account_by_phone(number)?
        };
        found.ok_or_else(|| Error::not_found(format!("recipient {}", recipient)))
    }

    /// Delete an account without ledger history
    pub fn close(&self, id: AccountId) -> Result<()> {
        self.store.delete_account(id)?;
        tracing::debug!(account = %id, "account closed");
        Ok(())
    }
}
