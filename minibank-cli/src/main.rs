//! Minibank CLI - accounts and transfers in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, config, credit, logs, transfer, tx};

/// Minibank - accounts and transfers in your terminal
#[derive(Parser)]
#[command(name = "mb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Move money from one account to another
    Transfer {
        /// Sending account ID
        from: i64,
        /// Receiving account ID, email or phone number
        to: String,
        /// Amount, at most two decimal places
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit an account from the system (stimulus when no amount is given)
    Credit {
        /// Account ID
        account: i64,
        /// Amount, defaults to the configured stimulus amount
        amount: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse the transaction ledger
    Tx {
        #[command(subcommand)]
        command: tx::TxCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change ledger settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MINIBANK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Account { command } => account::run(command),
        Commands::Transfer { from, to, amount, json } => transfer::run(from, &to, &amount, json),
        Commands::Credit { account, amount, json } => credit::run(account, amount, json),
        Commands::Tx { command } => tx::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transfer_accepts_email_recipient() {
        let cli = Cli::try_parse_from(["mb", "transfer", "1", "bob@example.com", "30.50"]).unwrap();
        match cli.command {
            Commands::Transfer { from, to, amount, json } => {
                assert_eq!(from, 1);
                assert_eq!(to, "bob@example.com");
                assert_eq!(amount, "30.50");
                assert!(!json);
            }
            _ => panic!("expected transfer"),
        }
    }
}
