//! DuckDB ledger store
//!
//! One connection guarded by a mutex. Opening a scope takes the mutex and
//! keeps it until the scope commits or drops, so balance reads and writes
//! of concurrent transfers never interleave within a process. Conflicts
//! DuckDB reports between separate connections surface as
//! `Error::ConcurrencyConflict`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::money::{from_minor_units, to_minor_units};
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountId, NewAccount, NewTransaction, Transaction, TransactionId, TransactionKind,
};
use crate::ports::{AccountStore, AtomicStore, Scope, TransactionLedger};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str = "account_id, first_name, last_name, email, phone_number, \
                               balance_minor, created_at, updated_at";

const TRANSACTION_COLUMNS: &str =
    "transaction_id, from_account, to_account, amount_minor, kind, created_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_open_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("could not set lock")
        || lower.contains("database is locked")
}

/// Check if an error message is DuckDB's optimistic concurrency failure
fn is_conflict_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("conflict") && !lower.contains("constraint")
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        let msg = err.to_string();
        if is_conflict_error(&msg) {
            Error::ConcurrencyConflict(msg)
        } else {
            Error::Persistence(msg)
        }
    }
}

/// An open DuckDB transaction holding the repository lock
///
/// Rolls back on drop unless committed.
pub struct DuckDbScope<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl<'a> DuckDbScope<'a> {
    fn begin(conn: MutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(Self { conn, open: true })
    }
}

impl Scope for DuckDbScope<'_> {
    fn commit(mut self) -> Result<()> {
        self.open = false;
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            // A failed COMMIT may leave the transaction open; nothing of it may survive
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(e.into());
        }
        Ok(())
    }

    fn rollback(mut self) -> Result<()> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for DuckDbScope<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::error!(error = %e, "rollback of abandoned scope failed");
            }
        }
    }
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when another process briefly holds the database.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_open_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error
            .map(Error::from)
            .unwrap_or_else(|| {
                Error::persistence(format!("failed to open database after {} retries", MAX_RETRIES))
            }))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; nothing here needs one
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A scope that panicked has already rolled back in Drop
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock();
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Total number of ledger entries
    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM sys_transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Sum of all account balances
    pub fn total_balance(&self) -> Result<Decimal> {
        let conn = self.lock();
        let minor: i64 = conn.query_row(
            "SELECT CAST(COALESCE(SUM(balance_minor), 0) AS BIGINT) FROM sys_accounts",
            [],
            |row| row.get(0),
        )?;
        Ok(from_minor_units(minor))
    }
}

fn query_account(conn: &Connection, id: AccountId) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM sys_accounts WHERE account_id = ?", ACCOUNT_COLUMNS);
    match conn.query_row(&sql, [id.0], row_to_account) {
        Ok(account) => Ok(Some(account)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn query_account_where(conn: &Connection, clause: &str, value: &dyn duckdb::ToSql) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM sys_accounts WHERE {} = ?", ACCOUNT_COLUMNS, clause);
    match conn.query_row(&sql, [value], row_to_account) {
        Ok(account) => Ok(Some(account)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;
    Ok(Account {
        id: AccountId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        balance: from_minor_units(row.get(5)?),
        created_at: parse_timestamp(&created_str),
        updated_at: parse_timestamp(&updated_str),
    })
}

fn row_to_transaction(row: &duckdb::Row) -> duckdb::Result<Transaction> {
    let kind_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;
    let kind = kind_str.parse::<TransactionKind>().map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(4, duckdb::types::Type::Text, e.into())
    })?;
    Ok(Transaction {
        id: TransactionId(row.get(0)?),
        from_account: row.get::<_, Option<i64>>(1)?.map(AccountId),
        to_account: AccountId(row.get(2)?),
        amount: from_minor_units(row.get(3)?),
        kind,
        created_at: parse_timestamp(&created_str),
    })
}

impl AtomicStore for DuckDbRepository {
    type Scope<'a> = DuckDbScope<'a>;

    fn begin(&self) -> Result<DuckDbScope<'_>> {
        DuckDbScope::begin(self.lock())
    }
}

impl AccountStore for DuckDbRepository {
    fn create_account(&self, account: &NewAccount) -> Result<Account> {
        account.validate().map_err(Error::validation)?;
        let email = NewAccount::normalize_email(&account.email);
        let balance_minor = to_minor_units(account.opening_balance)?;

        let conn = self.lock();
        if query_account_where(&conn, "email", &email)?.is_some() {
            return Err(Error::validation(format!("email {} is already registered", email)));
        }
        if let Some(number) = account.phone_number {
            if query_account_where(&conn, "phone_number", &number)?.is_some() {
                return Err(Error::validation(format!(
                    "phone number {} is already registered",
                    number
                )));
            }
        }

        let now = Utc::now().to_rfc3339();
        let id: i64 = conn.query_row(
            "INSERT INTO sys_accounts (first_name, last_name, email, phone_number,
                                       balance_minor, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING account_id",
            params![
                account.first_name.trim(),
                account.last_name.trim(),
                email,
                account.phone_number,
                balance_minor,
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        query_account(&conn, AccountId(id))?
            .ok_or_else(|| Error::persistence(format!("account {} vanished after insert", id)))
    }

    fn get_account(&self, id: AccountId) -> Result<Account> {
        let conn = self.lock();
        query_account(&conn, id)?.ok_or_else(|| Error::not_found(format!("account {}", id)))
    }

    fn get_account_for_update(&self, scope: &mut DuckDbScope<'_>, id: AccountId) -> Result<Account> {
        query_account(&scope.conn, id)?.ok_or_else(|| Error::not_found(format!("account {}", id)))
    }

    fn set_balance(&self, scope: &mut DuckDbScope<'_>, id: AccountId, balance: Decimal) -> Result<()> {
        let balance_minor = to_minor_units(balance)?;
        let updated = scope.conn.execute(
            "UPDATE sys_accounts SET balance_minor = ?, updated_at = ? WHERE account_id = ?",
            params![balance_minor, Utc::now().to_rfc3339(), id.0],
        )?;
        if updated == 0 {
            return Err(Error::not_found(format!("account {}", id)));
        }
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock();
        let sql = format!("SELECT {} FROM sys_accounts ORDER BY account_id", ACCOUNT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.lock();
        query_account_where(&conn, "email", &NewAccount::normalize_email(email))
    }

    fn find_account_by_phone(&self, number: i64) -> Result<Option<Account>> {
        let conn = self.lock();
        query_account_where(&conn, "phone_number", &number)
    }

    /// Refuses when any ledger entry names the account, so history is never orphaned
    fn delete_account(&self, id: AccountId) -> Result<()> {
        let conn = self.lock();
        if query_account(&conn, id)?.is_none() {
            return Err(Error::not_found(format!("account {}", id)));
        }

        let references: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_transactions WHERE from_account = ? OR to_account = ?",
            params![id.0, id.0],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(Error::AccountHasHistory(id));
        }

        conn.execute("DELETE FROM sys_accounts WHERE account_id = ?", params![id.0])?;
        Ok(())
    }
}

impl TransactionLedger for DuckDbRepository {
    fn append(&self, scope: &mut DuckDbScope<'_>, entry: NewTransaction) -> Result<TransactionId> {
        let amount_minor = to_minor_units(entry.amount)?;
        let id: i64 = scope.conn.query_row(
            "INSERT INTO sys_transactions (from_account, to_account, amount_minor, kind, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING transaction_id",
            params![
                entry.from_account.map(|a| a.0),
                entry.to_account.0,
                amount_minor,
                entry.kind.as_str(),
                Utc::now().to_rfc3339(),
            ],
            |row| row.get(0),
        )?;
        Ok(TransactionId(id))
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM sys_transactions WHERE transaction_id = ?",
            TRANSACTION_COLUMNS
        );
        match conn.query_row(&sql, [id.0], row_to_transaction) {
            Ok(tx) => Ok(tx),
            Err(duckdb::Error::QueryReturnedNoRows) => {
                Err(Error::not_found(format!("transaction {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        let conn = self.lock();
        // One row per entry, so a self-referencing entry still appears once
        let sql = format!(
            "SELECT {} FROM sys_transactions
             WHERE from_account = ? OR to_account = ?
             ORDER BY transaction_id ASC",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![account.0, account.0], row_to_transaction)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Transaction>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM sys_transactions ORDER BY transaction_id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([limit as i64], row_to_transaction)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

// Helper functions

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
