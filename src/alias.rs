/// A spending (or income) category users refer to by a short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub alias: &'static str,
    pub name: &'static str,
}

/// A supported ISO 4217 currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
}

/// Prefix that marks a currency token, e.g. `$USD`.
pub const CURRENCY_SIGIL: char = '$';

const CATEGORIES: &[Category] = &[
    Category { alias: "G", name: "Groceries" },
    Category { alias: "T", name: "Transport" },
    Category { alias: "R", name: "Rent" },
    Category { alias: "U", name: "Utilities" },
    Category { alias: "E", name: "Eating Out" },
    Category { alias: "H", name: "Health" },
    Category { alias: "S", name: "Shopping" },
    Category { alias: "F", name: "Fun" },
    Category { alias: "TR", name: "Travel" },
    Category { alias: "GI", name: "Gifts" },
    Category { alias: "ED", name: "Education" },
    Category { alias: "SUB", name: "Subscriptions" },
    Category { alias: "O", name: "Other" },
    Category { alias: "+", name: "Income" },
];

const CURRENCIES: &[Currency] = &[
    Currency { code: "ARS", name: "Argentine Peso" },
    Currency { code: "NZD", name: "New Zealand Dollar" },
    Currency { code: "USD", name: "US Dollar" },
    Currency { code: "EUR", name: "Euro" },
    Currency { code: "AUD", name: "Australian Dollar" },
    Currency { code: "JPY", name: "Japanese Yen" },
    Currency { code: "BRL", name: "Brazilian Real" },
    Currency { code: "GBP", name: "British Pound" },
    Currency { code: "CAD", name: "Canadian Dollar" },
    Currency { code: "CHF", name: "Swiss Franc" },
    Currency { code: "CNY", name: "Chinese Yuan" },
    Currency { code: "INR", name: "Indian Rupee" },
    Currency { code: "MXN", name: "Mexican Peso" },
    Currency { code: "ZAR", name: "South African Rand" },
    Currency { code: "SEK", name: "Swedish Krona" },
    Currency { code: "NOK", name: "Norwegian Krone" },
    Currency { code: "DKK", name: "Danish Krone" },
    Currency { code: "SGD", name: "Singapore Dollar" },
    Currency { code: "HKD", name: "Hong Kong Dollar" },
    Currency { code: "KRW", name: "South Korean Won" },
    Currency { code: "RUB", name: "Russian Ruble" },
    Currency { code: "TRY", name: "Turkish Lira" },
    Currency { code: "PLN", name: "Polish Zloty" },
    Currency { code: "THB", name: "Thai Baht" },
    Currency { code: "MYR", name: "Malaysian Ringgit" },
];

/// Fixed lookup tables for category and currency codes.
///
/// Built once at startup and shared by reference with the parsers and the
/// dispatcher. The tables are never mutated after construction.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    categories: &'static [Category],
    currencies: &'static [Currency],
}

impl AliasRegistry {
    pub fn standard() -> Self {
        Self {
            categories: CATEGORIES,
            currencies: CURRENCIES,
        }
    }

    /// Case-insensitive category lookup by alias.
    pub fn resolve_category(&self, code: &str) -> Option<&Category> {
        let code = code.trim().to_uppercase();
        self.categories.iter().find(|c| c.alias == code)
    }

    /// Case-insensitive currency lookup by ISO code.
    pub fn resolve_currency(&self, code: &str) -> Option<&Currency> {
        let code = code.trim().to_uppercase();
        self.currencies.iter().find(|c| c.code == code)
    }

    /// Resolves a `$CODE` token. Returns `None` when the sigil is missing.
    pub fn resolve_currency_marker(&self, token: &str) -> Option<Result<&Currency, String>> {
        let code = token.strip_prefix(CURRENCY_SIGIL)?;
        if code.is_empty() {
            return None;
        }
        Some(self.resolve_currency(code).ok_or_else(|| code.to_string()))
    }

    pub fn categories(&self) -> &[Category] {
        self.categories
    }

    pub fn currencies(&self) -> &[Currency] {
        self.currencies
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
