//! Logs command - inspect and prune the event log

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_minibank_dir;
use crate::output;
use minibank_core::{EntryPoint, LogEntry, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show the newest events
    Show {
        /// How many events to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Only failed commands
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete events older than a number of days
    Prune {
        /// Age in days
        #[arg(long, default_value = "30")]
        days: u32,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn open_log() -> Result<LoggingService> {
    let dir = get_minibank_dir()?;
    std::fs::create_dir_all(&dir)?;
    LoggingService::new(&dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .context("Failed to open the event log")
}

/// Unix ms timestamp `days` before `now`
fn prune_cutoff(now: DateTime<Utc>, days: u32) -> Result<i64> {
    let age = Duration::try_days(i64::from(days))
        .with_context(|| format!("{} days is too long", days))?;
    let cutoff = now
        .checked_sub_signed(age)
        .with_context(|| format!("{} days is too long", days))?;
    Ok(cutoff.timestamp_millis())
}

fn event_row(entry: LogEntry) -> Vec<String> {
    let at = Utc
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|at| output::format_time(&at))
        .unwrap_or_else(|| entry.timestamp.to_string());
    let failure = entry
        .error_kind
        .or(entry.error_message)
        .map(|kind| kind.red().to_string())
        .unwrap_or_default();
    vec![at, entry.event, entry.command.unwrap_or_default(), failure]
}

pub fn run(command: LogsCommands) -> Result<()> {
    let log = open_log()?;

    match command {
        LogsCommands::Show { limit, errors, json } => {
            let entries = if errors {
                log.get_errors(limit)?
            } else {
                log.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                output::info("The event log is empty.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Command", "Failure"]);
            for entry in entries {
                table.add_row(event_row(entry));
            }
            println!("{}", table);
            println!("{} events in {}", log.count()?, log.db_path().display());
        }
        LogsCommands::Prune { days, yes } => {
            let cutoff = prune_cutoff(Utc::now(), days)?;

            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("Delete events older than {} days?", days))
                    .default(false)
                    .interact()?;
            if !confirmed {
                output::info("Nothing deleted.");
                return Ok(());
            }

            let deleted = log.delete_before(cutoff)?;
            output::success(&format!("Deleted {} events", deleted));
        }
    }

    Ok(())
}
