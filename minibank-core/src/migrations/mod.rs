//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content), applied in order and
//! recorded in the database's own `sys_migrations` table.
//!
//! When adding a migration, create `NNN_description.sql` and append an
//! entry to the matching list below.

/// Ledger database (`minibank.duckdb`)
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_accounts.sql", include_str!("001_accounts.sql")),
    ("002_transactions.sql", include_str!("002_transactions.sql")),
];

/// Event log database (`logs.duckdb`)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("logs/000_migrations.sql")),
    ("001_event_log.sql", include_str!("logs/001_event_log.sql")),
];

/// Name of the bootstrap migration that creates `sys_migrations`
pub const BOOTSTRAP: &str = "000_migrations.sql";
