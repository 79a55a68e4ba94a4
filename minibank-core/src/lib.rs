//! Minibank Core - ledger and transfer logic for a small account system
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, money, errors)
//! - **ports**: Trait definitions for the transactional store (AtomicStore, AccountStore, TransactionLedger)
//! - **services**: Business logic orchestration (transfers, credits, history)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    Account, AccountId, NewAccount, NewTransaction, Transaction, TransactionId, TransactionKind,
};
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LogEntry, LogEvent, LoggingService};

/// File name of the ledger database inside the data directory
pub const DB_FILENAME: &str = "minibank.duckdb";

/// Main context for Minibank operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct MinibankContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService<DuckDbRepository>,
    pub transfer_service: TransferService<DuckDbRepository>,
    pub credit_service: CreditService<DuckDbRepository>,
    pub ledger_service: LedgerService<DuckDbRepository>,
}

impl MinibankContext {
    /// Create a new Minibank context, creating the data directory if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(DB_FILENAME);
        let repository = Arc::new(
            DuckDbRepository::new(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?,
        );

        // Initialize schema
        repository.ensure_schema()?;

        // Create services
        let account_service = AccountService::new(Arc::clone(&repository));
        let transfer_service = TransferService::new(Arc::clone(&repository))
            .with_max_conflict_retries(config.max_conflict_retries);
        let credit_service = CreditService::new(Arc::clone(&repository))
            .with_stimulus_amount(config.stimulus_amount)
            .with_max_conflict_retries(config.max_conflict_retries);
        let ledger_service = LedgerService::new(Arc::clone(&repository));

        tracing::debug!(path = %db_path.display(), "minibank context ready");

        Ok(Self {
            config,
            repository,
            account_service,
            transfer_service,
            credit_service,
            ledger_service,
        })
    }
}
