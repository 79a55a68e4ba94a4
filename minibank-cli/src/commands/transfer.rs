//! Transfer command - move money between two accounts

use std::collections::HashMap;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use minibank_core::ports::LedgerStore;
use minibank_core::services::AccountService;
use minibank_core::{AccountId, Error, OperationResult, TransactionId};

use super::{get_context, log_outcome};
use crate::output;

#[derive(Serialize)]
struct TransferReceipt {
    transaction_id: TransactionId,
    from_account: AccountId,
    to_account: AccountId,
    amount: Decimal,
}

/// Parse an amount argument such as `30` or `30.50`
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount: {}", raw))
}

/// A bare number is tried as an account id before falling back to a phone
/// lookup; store failures are reported as they are
fn resolve_recipient<S: LedgerStore>(
    accounts: &AccountService<S>,
    to: &str,
) -> minibank_core::domain::result::Result<AccountId> {
    if let Ok(id) = to.trim().parse::<i64>() {
        match accounts.get(AccountId(id)) {
            Ok(account) => return Ok(account.id),
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(accounts.find_recipient(to)?.id)
}

pub fn run(from: i64, to: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let amount = parse_amount(amount)?;
    let from = AccountId(from);

    let to_account = resolve_recipient(&ctx.account_service, to)?;

    let result = ctx
        .transfer_service
        .transfer(from, to_account, amount)
        .map(|transaction_id| TransferReceipt {
            transaction_id,
            from_account: from,
            to_account,
            amount,
        });
    log_outcome("transfer", &result);

    if json {
        let mut context = HashMap::new();
        if let Ok(sender) = ctx.account_service.get(from) {
            context.insert("from_balance".to_string(), serde_json::to_value(sender.balance)?);
        }
        let op = match result {
            Ok(receipt) => OperationResult::ok_with_context(receipt, context),
            Err(e) => OperationResult::<TransferReceipt>::from(Err(e)),
        };
        println!("{}", serde_json::to_string_pretty(&op)?);
        return Ok(());
    }

    let receipt = result?;
    output::success(&format!(
        "Transferred {} from account {} to account {} (transaction {})",
        output::format_money(receipt.amount),
        receipt.from_account,
        receipt.to_account,
        receipt.transaction_id
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use minibank_core::adapters::MemoryRepository;
    use minibank_core::NewAccount;

    #[test]
    fn test_resolve_recipient() {
        let accounts = AccountService::new(Arc::new(MemoryRepository::new()));
        let alice = accounts
            .open(&NewAccount::new("Alice", "A", "alice@example.com"))
            .unwrap();
        let bob = accounts
            .open(&NewAccount::new("Bob", "B", "bob@example.com").with_phone(5551234))
            .unwrap();

        assert_eq!(resolve_recipient(&accounts, &alice.id.to_string()).unwrap(), alice.id);
        assert_eq!(resolve_recipient(&accounts, "5551234").unwrap(), bob.id);
        assert_eq!(resolve_recipient(&accounts, "bob@example.com").unwrap(), bob.id);
        assert!(matches!(
            resolve_recipient(&accounts, "999"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 30.50 ").unwrap(), Decimal::new(3050, 2));
        assert!(parse_amount("thirty").is_err());
    }
}
