use rust_decimal::Decimal;

use crate::alias::AliasRegistry;
use crate::amount::parse_amounts;
use crate::error::CommandError;

/// A parsed `add` command, before it is turned into ledger entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransactionRequest {
    /// Canonical category name.
    pub category: String,
    /// Never empty. One ledger entry is created per amount.
    pub amounts: Vec<Decimal>,
    pub notes: String,
    /// Canonical ISO code from a trailing `$CODE` marker. `None` means the
    /// user's preferred currency applies.
    pub currency: Option<String>,
}

/// Parses the body of an `add` command:
/// `<category> <amount|(a-b-...)> [notes...] [$CURRENCY]`.
///
/// Only the last token may be a currency marker; a `$CODE` elsewhere is
/// kept as part of the notes.
pub fn parse_add_command(
    body: &str,
    registry: &AliasRegistry,
) -> Result<ParsedTransactionRequest, CommandError> {
    let tokens: Vec<&str> = body.split_whitespace().collect();
    let [category_token, amount_token, rest @ ..] = tokens.as_slice() else {
        return Err(CommandError::InvalidFormat(format!(
            "expected a category and an amount, got {body:?}"
        )));
    };

    let category = registry
        .resolve_category(category_token)
        .ok_or_else(|| CommandError::InvalidCategoryAlias(category_token.to_string()))?;

    let amounts = parse_amounts(amount_token)?;
    if amounts.is_empty() {
        return Err(CommandError::InvalidAmount(amount_token.to_string()));
    }

    let (currency, note_tokens) = match rest.split_last() {
        Some((last, init)) => match registry.resolve_currency_marker(last) {
            Some(Ok(currency)) => (Some(currency.code.to_string()), init),
            Some(Err(code)) => return Err(CommandError::InvalidCurrency(code)),
            None => (None, rest),
        },
        None => (None, rest),
    };

    tracing::debug!(category = category.name, ?amounts, ?currency, "parsed add command");

    Ok(ParsedTransactionRequest {
        category: category.name.to_string(),
        amounts,
        notes: note_tokens.join(" "),
        currency,
    })
}
