use crate::alias::AliasRegistry;
use crate::list::{AGGREGATE_TOKEN, ALL_TIME_TOKEN, DEFAULT_LIMIT, MAX_LIMIT};

/// Help text for `topic`, or the overview when the topic is missing or unknown.
pub fn help_text(topic: Option<&str>, registry: &AliasRegistry) -> String {
    match topic.map(str::to_lowercase).as_deref() {
        Some("add" | "a") => ADD_HELP.to_string(),
        Some("rm" | "remove" | "delete" | "del") => REMOVE_HELP.to_string(),
        Some("ls" | "list") => list_help(),
        Some("config" | "cfg") => CONFIG_HELP.to_string(),
        Some("categories" | "category") => categories(registry),
        Some("currencies" | "currency") => currencies(registry),
        _ => OVERVIEW.to_string(),
    }
}

const OVERVIEW: &str = "\
Commands:
  add <category> <amount> [notes] [$CURRENCY]   record a transaction
  rm <id> [id...]                               remove transactions
  ls [filters...]                               list transactions
  config set-default-currency <CODE>            set your currency
  help <topic>                                  add, rm, ls, config, categories, currencies";

const ADD_HELP: &str = "\
add <category> <amount> [notes] [$CURRENCY]
  G 45 Woolworths
  E 12,50 coffee $USD
  G (10-20-30) market     records three transactions";

const REMOVE_HELP: &str = "\
rm <id> [id...]
  Nothing is removed unless every id exists.";

const CONFIG_HELP: &str = "\
config                               show your settings
config set-default-currency <CODE>   currency used when add has no $CODE";

fn list_help() -> String {
    format!(
        "ls [category] [DD/MM/YYYY] [1-{MAX_LIMIT}] [{AGGREGATE_TOKEN}] [{ALL_TIME_TOKEN}] [$CURRENCY]\n\
         \x20 Defaults to the current cycle (since the 28th), {DEFAULT_LIMIT} rows.\n\
         \x20 {AGGREGATE_TOKEN}  totals per category\n\
         \x20 {ALL_TIME_TOKEN}  everything since the beginning"
    )
}

fn categories(registry: &AliasRegistry) -> String {
    let mut out = String::from("Categories:");
    for category in registry.categories() {
        out.push_str(&format!("\n  {} ({})", category.alias, category.name));
    }
    out
}

fn currencies(registry: &AliasRegistry) -> String {
    let mut out = String::from("Currencies:");
    for currency in registry.currencies() {
        out.push_str(&format!("\n  {} ({})", currency.code, currency.name));
    }
    out
}
