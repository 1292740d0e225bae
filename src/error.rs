use crate::dispatch::CommandKind;
use crate::store::{EntryId, StoreError};

/// Everything that can go wrong while handling one command.
///
/// The `Display` text is the internal detail meant for logs. What the user
/// gets to see comes from [`CommandError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required tokens are missing or the message is structurally malformed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unknown category alias {0:?}")]
    InvalidCategoryAlias(String),

    #[error("unsupported currency {0:?}")]
    InvalidCurrency(String),

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// A group total left the range `Decimal` can represent.
    #[error("total for {0} overflowed")]
    TotalOverflow(String),

    /// A list-filter token matched none of the recognised forms.
    #[error("unrecognised list argument {0:?}")]
    InvalidArgument(String),

    /// An entry with the same content hash already exists for the user.
    #[error("duplicate transaction (hash {0})")]
    DuplicateTransaction(String),

    /// Some of the requested ids do not belong to the user.
    #[error("transactions not found: {0:?}")]
    NotFound(Vec<EntryId>),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// Opaque failure reported by the persistence layer.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

const GENERIC_ERROR: &str = "Something went wrong, please try again later.";

impl CommandError {
    /// A generic, user-safe message for this error in the context of `kind`.
    pub fn user_message(&self, kind: CommandKind) -> String {
        match self {
            Self::InvalidCategoryAlias(alias) => {
                format!("\"{alias}\" is not a valid category. Send \"help categories\" to see them.")
            }
            Self::InvalidCurrency(code) => {
                format!("\"{code}\" is not a supported currency. Send \"help currencies\" to see them.")
            }
            Self::InvalidAmount(raw) => {
                format!("\"{raw}\" is not a valid amount. Use 12.50, 12,50 or (10-20-30).")
            }
            Self::TotalOverflow(category) => {
                format!("The {category} total is too large to add up. Try a shorter period.")
            }
            Self::InvalidArgument(token) => {
                format!("\"{token}\" is not a valid list option. Send \"help ls\" for the options.")
            }
            Self::DuplicateTransaction(_) => "This transaction was already recorded.".to_string(),
            Self::NotFound(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                format!("No transaction found with ID {}.", ids.join(", "))
            }
            Self::InvalidFormat(_) => usage(kind).to_string(),
            Self::UnknownCommand(_) => {
                "Unknown command. Send \"help\" to see what I understand.".to_string()
            }
            Self::Persistence(_) => GENERIC_ERROR.to_string(),
        }
    }
}

fn usage(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Add => "Please use the format: add <category> <amount> [notes] [$CURRENCY]",
        CommandKind::Remove => "Please use the format: rm <id> [id...]",
        CommandKind::List => {
            "Please use the format: ls [category] [DD/MM/YYYY] [1-100] [+] [*] [$CURRENCY]"
        }
        CommandKind::Config => "Please use the format: config set-default-currency <CODE>",
        CommandKind::Help | CommandKind::Unknown => GENERIC_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_persistence_detail() {
        let err = CommandError::Persistence(StoreError::Corrupt("bad row 7".to_string()));
        let msg = err.user_message(CommandKind::Add);
        assert!(!msg.contains("bad row"));
        assert!(err.to_string().contains("bad row 7"));
    }

    #[test]
    fn invalid_format_shows_command_usage() {
        let err = CommandError::InvalidFormat("missing amount".to_string());
        assert!(err.user_message(CommandKind::Add).starts_with("Please use the format: add"));
        assert!(err.user_message(CommandKind::Remove).contains("rm <id>"));
    }

    #[test]
    fn overflow_names_the_category() {
        let err = CommandError::TotalOverflow("Groceries".to_string());
        assert_eq!(
            err.user_message(CommandKind::List),
            "The Groceries total is too large to add up. Try a shorter period."
        );
    }

    #[test]
    fn not_found_lists_ids() {
        let err = CommandError::NotFound(vec![42, 43]);
        assert_eq!(
            err.user_message(CommandKind::Remove),
            "No transaction found with ID 42, 43."
        );
    }
}
