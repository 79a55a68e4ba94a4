//! Store ports - balances, the ledger, and the atomic scope they share

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Account, AccountId, NewAccount, NewTransaction, Transaction, TransactionId};

/// A unit of work whose writes become visible together or not at all
///
/// Dropping a scope without calling [`Scope::commit`] rolls it back, so
/// every early return and `?` inside a coordinator leaves the store as it
/// was before [`AtomicStore::begin`].
pub trait Scope {
    /// Make every write of this scope durable
    fn commit(self) -> Result<()>;

    /// Discard every write of this scope
    fn rollback(self) -> Result<()>;
}

/// A store that can open atomic scopes
///
/// Implementations must make scopes mutually exclusive (or detect
/// conflicts and report `Error::ConcurrencyConflict`), so that a balance
/// read inside a scope is still current when the scope writes it.
pub trait AtomicStore: Send + Sync {
    type Scope<'a>: Scope
    where
        Self: 'a;

    /// Open a new atomic scope
    fn begin(&self) -> Result<Self::Scope<'_>>;
}

/// Account balances and registration data
pub trait AccountStore: AtomicStore {
    /// Register a new account and return it with its assigned id
    fn create_account(&self, account: &NewAccount) -> Result<Account>;

    /// Get account by ID
    fn get_account(&self, id: AccountId) -> Result<Account>;

    /// Get account by ID as seen from inside `scope`
    fn get_account_for_update(&self, scope: &mut Self::Scope<'_>, id: AccountId)
        -> Result<Account>;

    /// Write a new balance inside `scope`, refreshing `updated_at`
    fn set_balance(
        &self,
        scope: &mut Self::Scope<'_>,
        id: AccountId,
        balance: Decimal,
    ) -> Result<()>;

    /// Get all accounts ordered by id
    fn list_accounts(&self) -> Result<Vec<Account>>;

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    fn find_account_by_phone(&self, number: i64) -> Result<Option<Account>>;

    /// Delete an account that no ledger entry references
    fn delete_account(&self, id: AccountId) -> Result<()>;
}

/// Append-only record of money movements
pub trait TransactionLedger: AtomicStore {
    /// Append an entry inside `scope` and return its id
    fn append(&self, scope: &mut Self::Scope<'_>, entry: NewTransaction) -> Result<TransactionId>;

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction>;

    /// Entries where `account` is sender or receiver, ascending id
    fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>>;

    /// Most recent entries first
    fn list_recent(&self, limit: usize) -> Result<Vec<Transaction>>;
}

/// Both halves of the ledger sharing one atomic scope
pub trait LedgerStore: AccountStore + TransactionLedger {}

impl<T: AccountStore + TransactionLedger> LedgerStore for T {}
