//! Ledger entry domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;

/// Ledger-assigned entry identifier, increasing in append order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money moved between two accounts
    Transfer,
    /// Money minted into an account from the system source
    Credit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Credit => "credit",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(TransactionKind::Transfer),
            "credit" => Ok(TransactionKind::Credit),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Debited account; `None` is the system source used by credits
    pub from_account: Option<AccountId>,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// Stamped by the ledger at append time
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether `account` is sender or receiver of this entry
    pub fn involves(&self, account: AccountId) -> bool {
        self.from_account == Some(account) || self.to_account == account
    }

    /// Label for the sending side, `SYSTEM` for minted credits
    pub fn source_label(&self) -> String {
        match self.from_account {
            Some(id) => id.to_string(),
            None => "SYSTEM".to_string(),
        }
    }
}

/// An entry about to be appended; id and timestamp come from the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub from_account: Option<AccountId>,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub kind: TransactionKind,
}

impl NewTransaction {
    pub fn transfer(from: AccountId, to: AccountId, amount: Decimal) -> Self {
        Self {
            from_account: Some(from),
            to_account: to,
            amount,
            kind: TransactionKind::Transfer,
        }
    }

    pub fn credit(to: AccountId, amount: Decimal) -> Self {
        Self {
            from_account: None,
            to_account: to,
            amount,
            kind: TransactionKind::Credit,
        }
    }

    /// Materialize with the ledger-assigned id and timestamp
    pub fn into_transaction(self, id: TransactionId, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            from_account: self.from_account,
            to_account: self.to_account,
            amount: self.amount,
            kind: self.kind,
            created_at,
        }
    }
}
