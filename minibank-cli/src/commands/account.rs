//! Account command - open, inspect and close accounts

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use rust_decimal::Decimal;

use minibank_core::{AccountId, NewAccount, OperationResult};

use super::{get_context, log_outcome};
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register a new account
    Open {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Phone number (digits only)
        #[arg(long)]
        phone: Option<i64>,
        /// Opening balance
        #[arg(long)]
        balance: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one account
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an account that has never moved money
    Close {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Open {
            first_name,
            last_name,
            email,
            phone,
            balance,
            json,
        } => run_open(first_name, last_name, email, phone, balance, json),
        AccountCommands::List { json } => run_list(json),
        AccountCommands::Show { id, json } => run_show(AccountId(id), json),
        AccountCommands::Close { id, force } => run_close(AccountId(id), force),
    }
}

fn run_open(
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<i64>,
    balance: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;

    let mut account = NewAccount::new(first_name, last_name, email);
    if let Some(number) = phone {
        account = account.with_phone(number);
    }
    if let Some(b) = balance {
        let opening: Decimal = b
            .trim()
            .parse()
            .with_context(|| format!("Invalid balance: {}", b))?;
        account = account.with_balance(opening);
    }

    let result = ctx.account_service.open(&account);
    log_outcome("account_open", &result);

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::from(result))?);
        return Ok(());
    }

    let created = result?;
    output::success(&format!(
        "Opened account {} for {}",
        created.id,
        created.display_name()
    ));
    Ok(())
}

fn run_list(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let accounts = ctx.account_service.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        output::info("No accounts yet. Use 'mb account open' to create one.");
        return Ok(());
    }

    println!("{}", output::accounts_table(&accounts));
    Ok(())
}

fn run_show(id: AccountId, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let account = ctx.account_service.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), account.id.to_string()]);
    table.add_row(vec!["Name".to_string(), account.display_name()]);
    table.add_row(vec!["Email".to_string(), account.email.clone()]);
    table.add_row(vec![
        "Phone".to_string(),
        account
            .phone_number
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Balance".to_string(), output::format_money(account.balance)]);
    table.add_row(vec!["Opened".to_string(), output::format_time(&account.created_at)]);
    println!("{}", table);
    Ok(())
}

fn run_close(id: AccountId, force: bool) -> Result<()> {
    let ctx = get_context()?;
    let account = ctx.account_service.get(id)?;

    if !force {
        println!(
            "\n{}",
            format!("This will delete account {} ({}).", id, account.display_name()).yellow()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let result = ctx.account_service.close(id);
    log_outcome("account_close", &result);
    result?;

    println!("\n{} Account {} closed\n", "✓".green(), id);
    Ok(())
}
