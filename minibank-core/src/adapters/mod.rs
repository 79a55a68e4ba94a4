//! Adapters - concrete implementations of port traits
//!
//! These implement the interfaces defined in `ports` for specific technologies.

pub mod duckdb;
pub mod memory;

pub use self::duckdb::{DuckDbRepository, DuckDbScope};
pub use self::memory::{MemoryRepository, MemoryScope};
