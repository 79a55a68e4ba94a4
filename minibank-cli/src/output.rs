//! Output formatting utilities

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use minibank_core::{Account, Transaction};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount with exactly two fractional digits
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn money_cell(amount: Decimal) -> Cell {
    Cell::new(format_money(amount)).set_alignment(CellAlignment::Right)
}

/// Table of accounts, one row each
pub fn accounts_table(accounts: &[Account]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Name", "Email", "Phone", "Balance"]);
    for account in accounts {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(account.display_name()),
            Cell::new(&account.email),
            Cell::new(
                account
                    .phone_number
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            ),
            money_cell(account.balance),
        ]);
    }
    table
}

/// Table of ledger entries in the order given
pub fn transactions_table(transactions: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Time", "Kind", "From", "To", "Amount"]);
    for tx in transactions {
        table.add_row(vec![
            Cell::new(tx.id),
            Cell::new(format_time(&tx.created_at)),
            Cell::new(tx.kind.as_str()),
            Cell::new(tx.source_label()),
            Cell::new(tx.to_account),
            money_cell(tx.amount),
        ]);
    }
    table
}
