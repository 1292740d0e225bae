use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::alias::AliasRegistry;
use crate::cycle::{cycle_start, local_midnight};
use crate::error::CommandError;
use crate::store::Window;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Lists everything since the epoch.
pub const ALL_TIME_TOKEN: &str = "*";
/// Switches the reply to per-category totals.
pub const AGGREGATE_TOKEN: &str = "+";

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Filter and aggregation settings for one `ls` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub from_time: DateTime<Utc>,
    /// Always the time the command was parsed.
    pub to_time: DateTime<Utc>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub aggregate: bool,
    pub limit: u32,
}

impl ListOptions {
    pub fn window(&self) -> Window {
        Window {
            from: self.from_time,
            to: self.to_time,
            limit: self.limit,
        }
    }
}

/// How a single list token was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ListToken {
    AllTime,
    Aggregate,
    Limit(u32),
    Since(NaiveDate),
    Category(String),
    Currency(String),
}

/// Classifies a token by the first form it matches, in this order: all-time
/// wildcard, aggregation wildcard, limit, date, category alias, currency.
fn classify(token: &str, registry: &AliasRegistry) -> Option<ListToken> {
    if token == ALL_TIME_TOKEN {
        return Some(ListToken::AllTime);
    }
    if token == AGGREGATE_TOKEN {
        return Some(ListToken::Aggregate);
    }
    if let Ok(limit) = token.parse::<u32>() {
        if (1..=MAX_LIMIT).contains(&limit) {
            return Some(ListToken::Limit(limit));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(token, DATE_FORMAT) {
        return Some(ListToken::Since(date));
    }
    if let Some(category) = registry.resolve_category(token) {
        return Some(ListToken::Category(category.name.to_string()));
    }
    if let Some(Ok(currency)) = registry.resolve_currency_marker(token) {
        return Some(ListToken::Currency(currency.code.to_string()));
    }
    None
}

/// Builds [`ListOptions`] from the tokens following `ls`.
///
/// Tokens may come in any order. Without tokens the listing covers the
/// current billing cycle up to `reference`, ten rows at most. A wildcard
/// raises the limit to [`MAX_LIMIT`] unless an explicit limit is given
/// anywhere in the command. Dates are read as local midnight in the
/// reference's time zone.
pub fn parse_list_options<Tz, S>(
    tokens: &[S],
    reference: &DateTime<Tz>,
    registry: &AliasRegistry,
) -> Result<ListOptions, CommandError>
where
    Tz: TimeZone,
    S: AsRef<str>,
{
    let mut options = ListOptions {
        from_time: cycle_start(reference).with_timezone(&Utc),
        to_time: reference.with_timezone(&Utc),
        category: None,
        currency: None,
        aggregate: false,
        limit: DEFAULT_LIMIT,
    };
    let mut explicit_limit = None;

    for token in tokens {
        let token = token.as_ref();
        let classified = classify(token, registry)
            .ok_or_else(|| CommandError::InvalidArgument(token.to_string()))?;
        tracing::debug!(token, ?classified, "classified list token");

        match classified {
            ListToken::AllTime => {
                options.from_time = DateTime::<Utc>::UNIX_EPOCH;
                options.limit = MAX_LIMIT;
            }
            ListToken::Aggregate => {
                options.aggregate = true;
                options.limit = MAX_LIMIT;
            }
            ListToken::Limit(limit) => explicit_limit = Some(limit),
            ListToken::Since(date) => {
                options.from_time = local_midnight(&reference.timezone(), date).with_timezone(&Utc);
            }
            ListToken::Category(name) => options.category = Some(name),
            ListToken::Currency(code) => options.currency = Some(code),
        }
    }

    if let Some(limit) = explicit_limit {
        options.limit = limit;
    }
    Ok(options)
}
