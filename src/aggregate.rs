use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::CommandError;
use crate::store::Entry;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub category: String,
    /// Set only when grouping by currency as well.
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub total: Decimal,
    pub count: u32,
}

/// Totals per category. Currencies are summed together, so callers use it
/// on entries already narrowed to one currency.
pub fn aggregate_by_category(entries: &[Entry]) -> Result<Vec<AggregatedGroup>, CommandError> {
    aggregate_by(entries, |e| GroupKey {
        category: e.category.clone(),
        currency: None,
    })
}

/// Totals per (category, currency) pair.
pub fn aggregate_by_category_and_currency(
    entries: &[Entry],
) -> Result<Vec<AggregatedGroup>, CommandError> {
    aggregate_by(entries, |e| GroupKey {
        category: e.category.clone(),
        currency: Some(e.currency.clone()),
    })
}

fn aggregate_by<F>(entries: &[Entry], key_of: F) -> Result<Vec<AggregatedGroup>, CommandError>
where
    F: Fn(&Entry) -> GroupKey,
{
    let mut groups: BTreeMap<GroupKey, (Decimal, u32)> = BTreeMap::new();
    for entry in entries {
        let (total, count) = groups.entry(key_of(entry)).or_default();
        *total = total
            .checked_add(entry.amount)
            .ok_or_else(|| CommandError::TotalOverflow(entry.category.clone()))?;
        *count += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (total, count))| AggregatedGroup { key, total, count })
        .collect())
}
