//! CLI command implementations

pub mod account;
pub mod config;
pub mod credit;
pub mod logs;
pub mod transfer;
pub mod tx;

use std::path::PathBuf;

use anyhow::{Context, Result};
use minibank_core::{EntryPoint, LogEvent, LoggingService, MinibankContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let minibank_dir = get_minibank_dir().ok()?;
    std::fs::create_dir_all(&minibank_dir).ok()?;
    LoggingService::new(&minibank_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::debug!(error = %e, "event log write failed");
        }
    }
}

/// Record the outcome of a ledger command in the event log
pub fn log_outcome<T>(command: &str, result: &minibank_core::domain::result::Result<T>) {
    let logger = get_logger();
    let event = match result {
        Ok(_) => LogEvent::new("command_executed").with_command(command),
        Err(e) => LogEvent::new(format!("{}_failed", command))
            .with_command(command)
            .with_error(e),
    };
    log_event(&logger, event);
}

/// Get the minibank directory from environment or default
pub fn get_minibank_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MINIBANK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".minibank"))
}

/// Open the ledger and wire up the services
pub fn get_context() -> Result<MinibankContext> {
    let minibank_dir = get_minibank_dir()?;
    MinibankContext::new(&minibank_dir).context("Failed to initialize minibank context")
}
