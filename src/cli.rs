use crate::store::UserId;
use clap::{Args, Parser, Subcommand};

/// Longest message the transport accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 160;

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(about = "Text-command interpreter for a personal ledger", long_about = None)]
pub struct Cli {
    /// Override tally home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "TALLY_HOME")]
    pub home: Option<std::path::PathBuf>,

    /// User the messages are sent as. Defaults to `default_user` from the config.
    #[arg(long, env = "TALLY_USER")]
    pub user: Option<UserId>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Handle a single message, e.g. `tally exec add G 45 Woolworths`.
    Exec(ExecArgs),
    /// Read one message per line from stdin until EOF.
    Repl,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Message time (RFC3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,

    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub message: Vec<String>,
}

/// Strips the optional `!` or `/` command prefix and checks the length.
///
/// The error is meant to be shown to the user as is.
pub fn prepare_message(raw: &str) -> Result<&str, String> {
    let trimmed = raw.trim();
    let text = trimmed
        .strip_prefix(['!', '/'])
        .unwrap_or(trimmed)
        .trim_start();

    if text.is_empty() {
        return Err("Empty message.".to_string());
    }
    if raw.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!("Messages are limited to {MAX_MESSAGE_CHARS} characters."));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_command_prefix() {
        assert_eq!(prepare_message("!add G 45"), Ok("add G 45"));
        assert_eq!(prepare_message("  /ls +  "), Ok("ls +"));
        assert_eq!(prepare_message("ls"), Ok("ls"));
    }

    #[test]
    fn rejects_empty_and_long_messages() {
        assert!(prepare_message("   ").is_err());
        assert!(prepare_message("!").is_err());
        let long = format!("add G 45 {}", "x".repeat(MAX_MESSAGE_CHARS));
        assert!(prepare_message(&long).is_err());
    }

    #[test]
    fn exec_takes_the_rest_as_message() {
        let cli = Cli::try_parse_from([
            "tally",
            "exec",
            "--at",
            "2025-03-15T10:00:00Z",
            "add",
            "G",
            "-5",
        ])
        .unwrap();
        let Command::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert_eq!(args.at.as_deref(), Some("2025-03-15T10:00:00Z"));
        assert_eq!(args.message, vec!["add", "G", "-5"]);
    }
}
