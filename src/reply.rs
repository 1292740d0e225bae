use crate::aggregate::AggregatedGroup;
use crate::dispatch::{Outcome, Reply};
use crate::store::Entry;
use chrono::TimeZone;
use std::fmt::Display;

const TIME_FORMAT: &str = "%d-%b-%Y %H:%M";
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Renders a reply as plain text, showing times in `tz`.
///
/// Failed commands render as their user-safe message.
pub fn render<Tz>(reply: &Reply, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let outcome = match &reply.result {
        Ok(outcome) => outcome,
        Err(err) => return err.user_message(reply.command),
    };

    match outcome {
        Outcome::Added { entries } => {
            format!("Recorded {}\n{}", plural(entries.len()), entry_table(entries, tz))
        }
        Outcome::Removed { entries } => {
            format!("Removed {}\n{}", plural(entries.len()), entry_table(entries, tz))
        }
        Outcome::Listed {
            options,
            entries,
            groups,
        } => {
            let since = options.from_time.with_timezone(tz).format(DATE_FORMAT);
            if entries.is_empty() {
                return format!("No transactions since {since}.");
            }
            match groups {
                Some(groups) => format!(
                    "Totals since {since}\n{}",
                    group_table(groups, options.currency.as_deref())
                ),
                None => format!(
                    "{} since {since}\n{}",
                    plural(entries.len()),
                    entry_table(entries, tz)
                ),
            }
        }
        Outcome::Help { text } => text.clone(),
        Outcome::Config { user, changed } => {
            if *changed {
                format!("Default currency set to {}.", user.preferred_currency)
            } else {
                format!("Default currency: {}", user.preferred_currency)
            }
        }
    }
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 transaction".to_string()
    } else {
        format!("{n} transactions")
    }
}

fn entry_table<Tz>(entries: &[Entry], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.category.clone(),
                format!("{:.2} {}", e.amount, e.currency),
                e.notes.clone(),
                e.timestamp.with_timezone(tz).format(TIME_FORMAT).to_string(),
            ]
        })
        .collect();
    table(&["ID", "Category", "Amount", "Notes", "At"], &rows)
}

/// `currency` labels groups that were not split by currency.
fn group_table(groups: &[AggregatedGroup], currency: Option<&str>) -> String {
    let mut groups: Vec<&AggregatedGroup> = groups.iter().collect();
    groups.sort_by(|a, b| a.key.cmp(&b.key));

    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| {
            let total = match g.key.currency.as_deref().or(currency) {
                Some(currency) => format!("{:.2} {currency}", g.total),
                None => format!("{:.2}", g.total),
            };
            vec![g.key.category.clone(), total, g.count.to_string()]
        })
        .collect();
    table(&["Category", "Total", "Count"], &rows)
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let mut out = String::from("|");
        for (i, &w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            out.push_str(&format!(" {cell:w$} |"));
        }
        out
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut lines = vec![line(&header_cells)];
    lines.push(
        widths
            .iter()
            .fold(String::from("|"), |acc, w| acc + &"-".repeat(w + 2) + "|"),
    );
    lines.extend(rows.iter().map(|row| line(row)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GroupKey;
    use crate::dispatch::CommandKind;
    use crate::error::CommandError;
    use crate::list::ListOptions;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    fn entry() -> Entry {
        Entry {
            id: 42,
            user_id: 1,
            category: "Groceries".to_string(),
            amount: Decimal::from(45),
            currency: "NZD".to_string(),
            notes: "Woolworths".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 15, 10, 5, 0).unwrap(),
            hash: "h".to_string(),
        }
    }

    fn reply(result: Result<Outcome, CommandError>, command: CommandKind) -> Reply {
        Reply { command, result }
    }

    #[test]
    fn added_shows_entry_row() {
        let text = render(
            &reply(Ok(Outcome::Added { entries: vec![entry()] }), CommandKind::Add),
            &Utc,
        );
        assert!(text.starts_with("Recorded 1 transaction\n"));
        assert!(text.contains("| 42 | Groceries | 45.00 NZD | Woolworths | 15-Mar-2025 10:05 |"));
    }

    #[test]
    fn aggregated_listing_shows_totals() {
        let options = ListOptions {
            from_time: Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap(),
            to_time: Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap(),
            category: None,
            currency: None,
            aggregate: true,
            limit: 100,
        };
        let groups = vec![AggregatedGroup {
            key: GroupKey {
                category: "Groceries".to_string(),
                currency: Some("NZD".to_string()),
            },
            total: Decimal::from(30),
            count: 2,
        }];
        let text = render(
            &reply(
                Ok(Outcome::Listed {
                    options,
                    entries: vec![entry()],
                    groups: Some(groups),
                }),
                CommandKind::List,
            ),
            &Utc,
        );
        assert!(text.starts_with("Totals since 28/02/2025\n"));
        assert!(text.contains("| Groceries | 30.00 NZD | 2     |"));
    }

    #[test]
    fn single_currency_totals_use_the_filter_code() {
        let options = ListOptions {
            from_time: Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap(),
            to_time: Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap(),
            category: None,
            currency: Some("USD".to_string()),
            aggregate: true,
            limit: 100,
        };
        let groups = vec![AggregatedGroup {
            key: GroupKey {
                category: "Groceries".to_string(),
                currency: None,
            },
            total: Decimal::from(25),
            count: 2,
        }];
        let text = render(
            &reply(
                Ok(Outcome::Listed {
                    options,
                    entries: vec![entry()],
                    groups: Some(groups),
                }),
                CommandKind::List,
            ),
            &Utc,
        );
        assert!(text.contains("| Groceries | 25.00 USD | 2     |"));
    }

    #[test]
    fn errors_render_as_user_message() {
        let text = render(
            &reply(Err(CommandError::NotFound(vec![43])), CommandKind::Remove),
            &Utc,
        );
        assert_eq!(text, "No transaction found with ID 43.");
    }

    #[test]
    fn empty_listing() {
        let options = ListOptions {
            from_time: DateTime::<Utc>::UNIX_EPOCH,
            to_time: Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap(),
            category: None,
            currency: None,
            aggregate: false,
            limit: 100,
        };
        let text = render(
            &reply(
                Ok(Outcome::Listed {
                    options,
                    entries: vec![],
                    groups: None,
                }),
                CommandKind::List,
            ),
            &Utc,
        );
        assert_eq!(text, "No transactions since 01/01/1970.");
    }
}
