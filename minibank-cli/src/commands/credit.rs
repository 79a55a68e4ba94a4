//! Credit command - mint money into an account

use anyhow::Result;

use minibank_core::{AccountId, OperationResult};

use super::transfer::parse_amount;
use super::{get_context, log_outcome};
use crate::output;

pub fn run(account: i64, amount: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let account = AccountId(account);

    let (result, granted) = match amount {
        Some(raw) => {
            let amount = parse_amount(&raw)?;
            (ctx.credit_service.credit(account, amount), amount)
        }
        None => (
            ctx.credit_service.stimulus(account),
            ctx.credit_service.stimulus_amount(),
        ),
    };
    log_outcome("credit", &result);

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::from(result))?);
        return Ok(());
    }

    let transaction_id = result?;
    output::success(&format!(
        "Credited {} to account {} (transaction {})",
        output::format_money(granted),
        account,
        transaction_id
    ));
    Ok(())
}
