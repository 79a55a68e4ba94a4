//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "ledger": { "stimulusAmount": "1000.00", "maxConflictRetries": 3 },
//!   ...
//! }
//! ```
//! Keys the core does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::validate_amount;
use crate::services::{
    default_stimulus_amount, DEFAULT_MAX_CONFLICT_RETRIES, MAX_CONFLICT_RETRIES_LIMIT,
};

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stimulus_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_conflict_retries: Option<u32>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Minibank configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Amount granted by a stimulus credit
    pub stimulus_amount: Decimal,
    /// Restarts of a transfer or credit after a concurrency conflict
    pub max_conflict_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stimulus_amount: default_stimulus_amount(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

impl Config {
    fn from_settings(raw: &SettingsFile) -> Self {
        let defaults = Self::default();
        Self {
            stimulus_amount: raw.ledger.stimulus_amount.unwrap_or(defaults.stimulus_amount),
            max_conflict_retries: raw
                .ledger
                .max_conflict_retries
                .unwrap_or(defaults.max_conflict_retries),
        }
    }

    fn validate(&self) -> Result<()> {
        validate_amount(self.stimulus_amount).context("Invalid stimulus amount")?;
        if self.max_conflict_retries > MAX_CONFLICT_RETRIES_LIMIT {
            anyhow::bail!(
                "maxConflictRetries must be at most {}, got {}",
                MAX_CONFLICT_RETRIES_LIMIT,
                self.max_conflict_retries
            );
        }
        Ok(())
    }

    /// Load config from the data directory
    ///
    /// Environment variables take precedence over the file:
    /// `MINIBANK_STIMULUS_AMOUNT` and `MINIBANK_MAX_CONFLICT_RETRIES`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::from_settings(&read_settings(&data_dir.join(SETTINGS_FILE))?);

        if let Ok(value) = std::env::var("MINIBANK_STIMULUS_AMOUNT") {
            config.stimulus_amount = value
                .trim()
                .parse::<Decimal>()
                .with_context(|| format!("MINIBANK_STIMULUS_AMOUNT is not a number: {}", value))?;
        }
        if let Ok(value) = std::env::var("MINIBANK_MAX_CONFLICT_RETRIES") {
            config.max_conflict_retries = value.trim().parse::<u32>().with_context(|| {
                format!("MINIBANK_MAX_CONFLICT_RETRIES is not a count: {}", value)
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only what `settings.json` says, ignoring environment overrides
    pub fn load_file(data_dir: &Path) -> Result<Self> {
        let config = Self::from_settings(&read_settings(&data_dir.join(SETTINGS_FILE))?);
        config.validate()?;
        Ok(config)
    }

    /// Save config to the data directory
    /// Preserves other settings that the core doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.validate()?;

        let settings_path = data_dir.join(SETTINGS_FILE);
        let mut settings = read_settings(&settings_path)?;

        settings.ledger.stimulus_amount = Some(self.stimulus_amount);
        settings.ledger.max_conflict_retries = Some(self.max_conflict_retries);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }
}
