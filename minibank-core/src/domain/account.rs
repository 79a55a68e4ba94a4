//! Account domain model

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store-assigned account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account and its current balance
///
/// The identity fields (names, email, phone) are owned by registration;
/// the balance is only ever changed by the transfer and credit services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<i64>,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    /// Last balance mutation
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration data for a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<i64>,
    pub opening_balance: Decimal,
}

impl NewAccount {
    /// Create registration data with a zero opening balance
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone_number: None,
            opening_balance: Decimal::ZERO,
        }
    }

    pub fn with_phone(mut self, number: i64) -> Self {
        self.phone_number = Some(number);
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.opening_balance = balance;
        self
    }

    /// Normalize email to lowercase, trimmed
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Validate registration data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("account holder name cannot be empty");
        }
        if !self.email.contains('@') {
            return Err("email must contain '@'");
        }
        if matches!(self.phone_number, Some(n) if n <= 0) {
            return Err("phone number must be positive");
        }
        if self.opening_balance < Decimal::ZERO {
            return Err("opening balance cannot be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalization() {
        assert_eq!(NewAccount::normalize_email(" Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_new_account_validation() {
        let account = NewAccount::new("Ada", "Lovelace", "ada@example.com");
        assert!(account.validate().is_ok());

        let no_name = NewAccount::new("", "Lovelace", "ada@example.com");
        assert!(no_name.validate().is_err());

        let bad_email = NewAccount::new("Ada", "Lovelace", "ada.example.com");
        assert!(bad_email.validate().is_err());

        let negative = NewAccount::new("Ada", "Lovelace", "ada@example.com")
            .with_balance(Decimal::new(-100, 2));
        assert!(negative.validate().is_err());
    }
}
