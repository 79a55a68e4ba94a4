//! In-memory ledger store
//!
//! Intended for tests and demos. A scope holds the state lock for its whole
//! life and stages its writes; commit applies them, drop discards them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::money::to_minor_units;
use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountId, NewAccount, NewTransaction, Transaction, TransactionId};
use crate::ports::{AccountStore, AtomicStore, Scope, TransactionLedger};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    ledger: Vec<Transaction>,
    next_account_id: i64,
    next_transaction_id: i64,
}

impl MemoryState {
    fn allocate_account_id(&mut self) -> AccountId {
        self.next_account_id += 1;
        AccountId(self.next_account_id)
    }

    // Ids handed out to a scope that later rolls back are not reused,
    // matching a database sequence.
    fn allocate_transaction_id(&mut self) -> TransactionId {
        self.next_transaction_id += 1;
        TransactionId(self.next_transaction_id)
    }
}

/// Staged writes of an open scope
pub struct MemoryScope<'a> {
    state: MutexGuard<'a, MemoryState>,
    balances: HashMap<AccountId, (Decimal, DateTime<Utc>)>,
    appended: Vec<Transaction>,
}

impl Scope for MemoryScope<'_> {
    fn commit(mut self) -> Result<()> {
        let balances = std::mem::take(&mut self.balances);
        for (id, (balance, updated_at)) in balances {
            let account = self
                .state
                .accounts
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(format!("account {}", id)))?;
            account.balance = balance;
            account.updated_at = updated_at;
        }
        let appended = std::mem::take(&mut self.appended);
        self.state.ledger.extend(appended);
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        Ok(())
    }
}

/// In-memory implementation of the ledger store ports
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Staged writes live in the scope, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AtomicStore for MemoryRepository {
    type Scope<'a> = MemoryScope<'a>;

    fn begin(&self) -> Result<MemoryScope<'_>> {
        Ok(MemoryScope {
            state: self.lock(),
            balances: HashMap::new(),
            appended: Vec::new(),
        })
    }
}

impl AccountStore for MemoryRepository {
    fn create_account(&self, account: &NewAccount) -> Result<Account> {
        account.validate().map_err(Error::validation)?;
        to_minor_units(account.opening_balance)?;
        let email = NewAccount::normalize_email(&account.email);

        let mut state = self.lock();
        if state.accounts.values().any(|a| a.email == email) {
            return Err(Error::validation(format!("email {} is already registered", email)));
        }
        if let Some(number) = account.phone_number {
            if state.accounts.values().any(|a| a.phone_number == Some(number)) {
                return Err(Error::validation(format!(
                    "phone number {} is already registered",
                    number
                )));
            }
        }

        let now = Utc::now();
        let created = Account {
            id: state.allocate_account_id(),
            first_name: account.first_name.trim().to_string(),
            last_name: account.last_name.trim().to_string(),
            email,
            phone_number: account.phone_number,
            balance: account.opening_balance,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    fn get_account(&self, id: AccountId) -> Result<Account> {
        self.lock()
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", id)))
    }

    fn get_account_for_update(&self, scope: &mut MemoryScope<'_>, id: AccountId) -> Result<Account> {
        let mut account = scope
            .state
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", id)))?;
        if let Some((balance, updated_at)) = scope.balances.get(&id) {
            account.balance = *balance;
            account.updated_at = *updated_at;
        }
        Ok(account)
    }

    fn set_balance(&self, scope: &mut MemoryScope<'_>, id: AccountId, balance: Decimal) -> Result<()> {
        if !scope.state.accounts.contains_key(&id) {
            return Err(Error::not_found(format!("account {}", id)));
        }
        if balance < Decimal::ZERO {
            return Err(Error::persistence(format!(
                "balance of account {} cannot be negative",
                id
            )));
        }
        to_minor_units(balance)?;
        scope.balances.insert(id, (balance, Utc::now()));
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.lock().accounts.values().cloned().collect())
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = NewAccount::normalize_email(email);
        Ok(self.lock().accounts.values().find(|a| a.email == email).cloned())
    }

    fn find_account_by_phone(&self, number: i64) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| a.phone_number == Some(number))
            .cloned())
    }

    fn delete_account(&self, id: AccountId) -> Result<()> {
        let mut state = self.lock();
        if !state.accounts.contains_key(&id) {
            return Err(Error::not_found(format!("account {}", id)));
        }
        if state.ledger.iter().any(|t| t.involves(id)) {
            return Err(Error::AccountHasHistory(id));
        }
        state.accounts.remove(&id);
        Ok(())
    }
}

impl TransactionLedger for MemoryRepository {
    fn append(&self, scope: &mut MemoryScope<'_>, entry: NewTransaction) -> Result<TransactionId> {
        if entry.amount <= Decimal::ZERO {
            return Err(Error::persistence("ledger amounts must be positive"));
        }
        to_minor_units(entry.amount)?;
        let id = scope.state.allocate_transaction_id();
        scope.appended.push(entry.into_transaction(id, Utc::now()));
        Ok(id)
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.lock()
            .ledger
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("transaction {}", id)))
    }

    fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        // The ledger vector is already in id order
        Ok(self
            .lock()
            .ledger
            .iter()
            .filter(|t| t.involves(account))
            .cloned()
            .collect())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Transaction>> {
        Ok(self.lock().ledger.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_balance_visible_inside_scope_only() {
        let repo = MemoryRepository::new();
        let account = repo
            .create_account(
                &NewAccount::new("Ada", "Lovelace", "ada@example.com")
                    .with_balance(Decimal::new(5000, 2)),
            )
            .unwrap();

        let mut scope = repo.begin().unwrap();
        repo.set_balance(&mut scope, account.id, Decimal::new(100, 2)).unwrap();
        let inside = repo.get_account_for_update(&mut scope, account.id).unwrap();
        assert_eq!(inside.balance, Decimal::new(100, 2));
        drop(scope);

        assert_eq!(repo.get_account(account.id).unwrap().balance, Decimal::new(5000, 2));
    }

    #[test]
    fn test_rolled_back_ids_are_not_reused() {
        let repo = MemoryRepository::new();
        let account = repo
            .create_account(&NewAccount::new("Ada", "Lovelace", "ada@example.com"))
            .unwrap();

        let mut scope = repo.begin().unwrap();
        let abandoned = repo
            .append(&mut scope, NewTransaction::credit(account.id, Decimal::ONE))
            .unwrap();
        scope.rollback().unwrap();

        let mut scope = repo.begin().unwrap();
        let kept = repo
            .append(&mut scope, NewTransaction::credit(account.id, Decimal::ONE))
            .unwrap();
        scope.commit().unwrap();

        assert!(kept > abandoned);
        assert_eq!(repo.list_for_account(account.id).unwrap().len(), 1);
        assert!(matches!(repo.get_transaction(abandoned), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_lookup_by_phone_and_email() {
        let repo = MemoryRepository::new();
        let account = repo
            .create_account(&NewAccount::new("Ada", "Lovelace", "ada@example.com").with_phone(5551234))
            .unwrap();

        assert_eq!(repo.find_account_by_phone(5551234).unwrap().unwrap().id, account.id);
        assert_eq!(
            repo.find_account_by_email("ADA@example.com").unwrap().unwrap().id,
            account.id
        );
        assert!(repo.find_account_by_phone(1).unwrap().is_none());
    }
}
