//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod money;
mod transaction;
pub mod result;

pub use account::{Account, AccountId, NewAccount};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionKind};
