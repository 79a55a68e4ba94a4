//! Config command - view and change ledger settings

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;

use super::get_minibank_dir;
use super::transfer::parse_amount;
use crate::output;
use minibank_core::config::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the settings in effect, including environment overrides
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change settings stored in settings.json
    Set {
        /// Amount granted by a stimulus credit
        #[arg(long)]
        stimulus_amount: Option<String>,
        /// Restarts of a conflicting transfer or credit
        #[arg(long)]
        max_conflict_retries: Option<u32>,
    },
}

/// Apply the given changes to the stored settings and save them
fn update(
    data_dir: &Path,
    stimulus_amount: Option<Decimal>,
    max_conflict_retries: Option<u32>,
) -> Result<Config> {
    let mut config = Config::load_file(data_dir)?;
    if let Some(amount) = stimulus_amount {
        config.stimulus_amount = amount;
    }
    if let Some(retries) = max_conflict_retries {
        config.max_conflict_retries = retries;
    }
    config.save(data_dir)?;
    Ok(config)
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let dir = get_minibank_dir()?;
    std::fs::create_dir_all(&dir)?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "stimulus_amount": config.stimulus_amount,
                        "max_conflict_retries": config.max_conflict_retries,
                    })
                );
            } else {
                println!("{}", "Ledger settings".bold());
                println!("  Stimulus amount: {}", output::format_money(config.stimulus_amount));
                println!("  Max conflict retries: {}", config.max_conflict_retries);
            }
        }
        ConfigCommands::Set {
            stimulus_amount,
            max_conflict_retries,
        } => {
            if stimulus_amount.is_none() && max_conflict_retries.is_none() {
                output::info("Nothing to change.");
                return Ok(());
            }
            let stimulus_amount = stimulus_amount.as_deref().map(parse_amount).transpose()?;
            let config = update(&dir, stimulus_amount, max_conflict_retries)?;
            output::success(&format!(
                "Saved: stimulus amount {}, max conflict retries {}",
                output::format_money(config.stimulus_amount),
                config.max_conflict_retries
            ));
        }
    }

    Ok(())
}
