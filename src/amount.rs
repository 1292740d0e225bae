use rust_decimal::Decimal;

use crate::error::CommandError;

/// Parses an amount token into one or more amounts.
///
/// A token containing either parenthesis is a batch: all parentheses are
/// dropped and the rest is split on `-`, one amount per piece, in input
/// order. Anything else is a single amount. Both `,` and `.` are accepted as
/// the decimal separator.
pub fn parse_amounts(token: &str) -> Result<Vec<Decimal>, CommandError> {
    if !token.contains(['(', ')']) {
        return Ok(vec![parse_decimal(token)?]);
    }

    let inner: String = token.chars().filter(|c| !matches!(c, '(' | ')')).collect();
    if inner.trim().is_empty() {
        return Err(CommandError::InvalidAmount(token.to_string()));
    }

    inner.split('-').map(parse_decimal).collect()
}

fn parse_decimal(raw: &str) -> Result<Decimal, CommandError> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(CommandError::InvalidAmount(raw.to_string()));
    }
    normalized
        .parse::<Decimal>()
        .map_err(|_| CommandError::InvalidAmount(raw.to_string()))
}
