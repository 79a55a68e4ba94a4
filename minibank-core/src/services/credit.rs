//! Credit service - system-funded deposits ("stimulus")
//!
//! A credit mints money: it raises one balance and records a `Credit`
//! entry from the system source. There is no funds check, so callers must
//! authorize credits before they reach this service.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::retry::{retry_on_conflict, DEFAULT_MAX_CONFLICT_RETRIES};
use crate::domain::money::{checked_add, validate_amount};
use crate::domain::result::Result;
use crate::domain::{AccountId, NewTransaction, TransactionId};
use crate::ports::{LedgerStore, Scope};

/// Amount granted by [`CreditService::stimulus`] unless configured otherwise
pub fn default_stimulus_amount() -> Decimal {
    Decimal::new(100000, 2)
}

/// Service minting money into a single account
pub struct CreditService<S> {
    store: Arc<S>,
    stimulus_amount: Decimal,
    max_conflict_retries: u32,
}

impl<S: LedgerStore> CreditService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            stimulus_amount: default_stimulus_amount(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_stimulus_amount(mut self, amount: Decimal) -> Self {
        self.stimulus_amount = amount;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn stimulus_amount(&self) -> Decimal {
        self.stimulus_amount
    }

    /// Credit `amount` to `account` from the system source
    pub fn credit(&self, account: AccountId, amount: Decimal) -> Result<TransactionId> {
        validate_amount(amount)?;

        retry_on_conflict("credit", self.max_conflict_retries, || {
            self.attempt(account, amount)
                .inspect(|id| tracing::debug!(%account, transaction = %id, "credit committed"))
                .inspect_err(|e| tracing::warn!(%account, error = %e, "credit rolled back"))
        })
    }

    /// Credit the configured stimulus amount
    pub fn stimulus(&self, account: AccountId) -> Result<TransactionId> {
        self.credit(account, self.stimulus_amount)
    }

    fn attempt(&self, account: AccountId, amount: Decimal) -> Result<TransactionId> {
        let mut scope = self.store.begin()?;

        let current = self.store.get_account_for_update(&mut scope, account)?;
        let balance = checked_add(current.balance, amount)?;
        self.store.set_balance(&mut scope, account, balance)?;
        let id = self
            .store
            .append(&mut scope, NewTransaction::credit(account, amount))?;

        scope.commit()?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryRepository;
    use crate::domain::result::Error;
    use crate::domain::{NewAccount, TransactionKind};
    use crate::ports::{AccountStore, TransactionLedger};

    fn setup(balance: Decimal) -> (Arc<MemoryRepository>, AccountId) {
        let repo = Arc::new(MemoryRepository::new());
        let account = repo
            .create_account(&NewAccount::new("Alice", "A", "a@example.com").with_balance(balance))
            .unwrap();
        (repo, account.id)
    }

    #[test]
    fn test_credit_mints_from_system() {
        let (repo, a) = setup(Decimal::new(70, 0));
        let service = CreditService::new(Arc::clone(&repo));

        let id = service.credit(a, Decimal::new(1000, 0)).unwrap();

        assert_eq!(repo.get_account(a).unwrap().balance, Decimal::new(1070, 0));
        let entry = repo.get_transaction(id).unwrap();
        assert_eq!(entry.kind, TransactionKind::Credit);
        assert_eq!(entry.from_account, None);
        assert_eq!(entry.to_account, a);
    }

    #[test]
    fn test_stimulus_uses_configured_amount() {
        let (repo, a) = setup(Decimal::ZERO);
        let service =
            CreditService::new(Arc::clone(&repo)).with_stimulus_amount(Decimal::new(25050, 2));

        service.stimulus(a).unwrap();
        assert_eq!(repo.get_account(a).unwrap().balance, Decimal::new(25050, 2));
    }

    #[test]
    fn test_non_positive_credit_rejected() {
        let (repo, a) = setup(Decimal::ZERO);
        let service = CreditService::new(Arc::clone(&repo));

        assert!(matches!(service.credit(a, Decimal::ZERO), Err(Error::InvalidAmount(_))));
        assert!(matches!(
            service.credit(a, Decimal::new(-1, 0)),
            Err(Error::InvalidAmount(_))
        ));
        assert!(repo.list_for_account(a).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_credit_and_opening_balance_rejected() {
        let (repo, a) = setup(Decimal::ZERO);
        let service = CreditService::new(Arc::clone(&repo));

        assert!(matches!(service.credit(a, Decimal::MAX), Err(Error::InvalidAmount(_))));
        assert!(matches!(
            repo.create_account(
                &NewAccount::new("Rich", "R", "rich@example.com").with_balance(Decimal::MAX)
            ),
            Err(Error::InvalidAmount(_))
        ));
        assert_eq!(repo.get_account(a).unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_credit_unknown_account() {
        let (repo, _) = setup(Decimal::ZERO);
        let service = CreditService::new(Arc::clone(&repo));
        assert!(matches!(
            service.credit(AccountId(404), Decimal::ONE),
            Err(Error::NotFound(_))
        ));
        assert!(repo.list_recent(10).unwrap().is_empty());
    }
}
