//! Tx command - browse the transaction ledger

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use minibank_core::services::DEFAULT_RECENT_LIMIT;
use minibank_core::{AccountId, TransactionId};

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum TxCommands {
    /// History of one account, oldest first
    List {
        account: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one ledger entry
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Latest entries across all accounts
    Recent {
        /// Number of entries to show
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: TxCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        TxCommands::List { account, json } => {
            let account = AccountId(account);
            let history = ctx.ledger_service.list_for_account(account)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
                return Ok(());
            }
            if history.is_empty() {
                output::info(&format!("No transactions for account {}.", account));
                return Ok(());
            }
            println!("{}", output::transactions_table(&history));
        }
        TxCommands::Show { id, json } => {
            let tx = ctx.ledger_service.get_transaction(TransactionId(id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
                return Ok(());
            }
            println!("{}", format!("Transaction {}", tx.id).bold());
            println!("  Kind:   {}", tx.kind.as_str());
            println!("  From:   {}", tx.source_label());
            println!("  To:     {}", tx.to_account);
            println!("  Amount: {}", output::format_money(tx.amount));
            println!("  Time:   {}", output::format_time(&tx.created_at));
        }
        TxCommands::Recent { limit, json } => {
            let recent = ctx.ledger_service.recent(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&recent)?);
                return Ok(());
            }
            if recent.is_empty() {
                output::info("The ledger is empty.");
                return Ok(());
            }
            println!("{}", output::transactions_table(&recent));
        }
    }

    Ok(())
}
