//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod credit;
mod ledger;
pub mod logging;
pub mod migration;
mod retry;
mod transfer;

pub use account::AccountService;
pub use credit::{default_stimulus_amount, CreditService};
pub use ledger::{LedgerService, DEFAULT_RECENT_LIMIT};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use retry::{DEFAULT_MAX_CONFLICT_RETRIES, MAX_CONFLICT_RETRIES_LIMIT};
pub use transfer::{TransferService, TransferStage};
