use chrono::{DateTime, TimeZone, Utc};

use crate::add::parse_add_command;
use crate::aggregate::{
    AggregatedGroup, aggregate_by_category, aggregate_by_category_and_currency,
};
use crate::alias::AliasRegistry;
use crate::error::CommandError;
use crate::hash::{DedupWindow, HashInput, transaction_hash};
use crate::help::help_text;
use crate::list::{ListOptions, parse_list_options};
use crate::store::{Entry, EntryId, LedgerStore, NewEntry, StoreError, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Add,
    Remove,
    List,
    Help,
    Config,
    Unknown,
}

/// A message split into its command and that command's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Everything after the command word, untouched.
    Add(&'a str),
    Remove(Vec<&'a str>),
    List(Vec<&'a str>),
    Help(Option<&'a str>),
    Config(Vec<&'a str>),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    /// Routes on the first word of an already de-prefixed message.
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();
        let (head, rest) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        let args = || rest.split_whitespace().collect::<Vec<_>>();

        match head.to_lowercase().as_str() {
            "add" | "a" => Command::Add(rest),
            "rm" | "remove" | "r" | "delete" | "del" | "d" => Command::Remove(args()),
            "ls" | "list" | "l" => Command::List(args()),
            "help" | "h" | "?" => Command::Help(rest.split_whitespace().next()),
            "config" | "cfg" => Command::Config(args()),
            _ => Command::Unknown(head),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Add(_) => CommandKind::Add,
            Command::Remove(_) => CommandKind::Remove,
            Command::List(_) => CommandKind::List,
            Command::Help(_) => CommandKind::Help,
            Command::Config(_) => CommandKind::Config,
            Command::Unknown(_) => CommandKind::Unknown,
        }
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added {
        entries: Vec<Entry>,
    },
    Removed {
        entries: Vec<Entry>,
    },
    Listed {
        options: ListOptions,
        entries: Vec<Entry>,
        /// Present when the listing asked for totals.
        groups: Option<Vec<AggregatedGroup>>,
    },
    Help {
        text: String,
    },
    Config {
        user: User,
        changed: bool,
    },
}

#[derive(Debug)]
pub struct Reply {
    pub command: CommandKind,
    pub result: Result<Outcome, CommandError>,
}

impl Reply {
    /// The user-safe error text, if the command failed.
    pub fn user_error(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|err| err.user_message(self.command))
    }
}

/// Turns de-prefixed messages into ledger operations against a store.
pub struct Dispatcher<'a, S> {
    store: &'a mut S,
    registry: &'a AliasRegistry,
    dedup_window: DedupWindow,
}

impl<'a, S: LedgerStore> Dispatcher<'a, S> {
    pub fn new(store: &'a mut S, registry: &'a AliasRegistry) -> Self {
        Self {
            store,
            registry,
            dedup_window: DedupWindow::default(),
        }
    }

    pub fn with_dedup_window(mut self, window: DedupWindow) -> Self {
        self.dedup_window = window;
        self
    }

    /// Handles one message sent by `user_id` at `at`.
    ///
    /// `at` also fixes the time zone used for billing cycles and dates.
    pub fn dispatch<Tz: TimeZone>(
        &mut self,
        text: &str,
        at: &DateTime<Tz>,
        user_id: UserId,
    ) -> Reply {
        let command = Command::parse(text);
        let kind = command.kind();

        let result = match command {
            Command::Add(body) => self.add(body, at.with_timezone(&Utc), user_id),
            Command::Remove(args) => self.remove(&args, user_id),
            Command::List(args) => self.list(&args, at, user_id),
            Command::Help(topic) => Ok(Outcome::Help {
                text: help_text(topic, self.registry),
            }),
            Command::Config(args) => self.config(&args, user_id),
            Command::Unknown(head) => Err(CommandError::UnknownCommand(head.to_string())),
        };

        match &result {
            Ok(_) => tracing::info!(user_id, command = ?kind, "command handled"),
            Err(err) => tracing::warn!(user_id, command = ?kind, error = %err, "command failed"),
        }

        Reply {
            command: kind,
            result,
        }
    }

    fn add(
        &mut self,
        body: &str,
        timestamp: DateTime<Utc>,
        user_id: UserId,
    ) -> Result<Outcome, CommandError> {
        let request = parse_add_command(body, self.registry)?;
        let user = self.store.get_or_create_user(user_id)?;
        let currency = request
            .currency
            .clone()
            .unwrap_or(user.preferred_currency);

        let new_entries: Vec<NewEntry> = request
            .amounts
            .iter()
            .enumerate()
            .map(|(batch_index, &amount)| {
                let hash = transaction_hash(
                    &HashInput {
                        category: &request.category,
                        amount,
                        notes: &request.notes,
                        timestamp,
                        user_id,
                        batch_index,
                        currency: &currency,
                    },
                    self.dedup_window,
                );
                NewEntry {
                    user_id,
                    category: request.category.clone(),
                    amount,
                    currency: currency.clone(),
                    notes: request.notes.clone(),
                    timestamp,
                    hash,
                }
            })
            .collect();

        // The whole batch is rejected if any part of it was seen before.
        for new_entry in &new_entries {
            if self.store.find_by_hash(&new_entry.hash, user_id)?.is_some() {
                return Err(CommandError::DuplicateTransaction(new_entry.hash.clone()));
            }
        }

        let entries = self
            .store
            .create_entries(&new_entries)
            .map_err(|err| match err {
                StoreError::DuplicateHash => {
                    CommandError::DuplicateTransaction(new_entries[0].hash.clone())
                }
                other => other.into(),
            })?;

        for entry in &entries {
            tracing::info!(
                user_id,
                id = entry.id,
                category = %entry.category,
                amount = %entry.amount,
                "recorded entry"
            );
        }
        Ok(Outcome::Added { entries })
    }

    fn remove(&mut self, args: &[&str], user_id: UserId) -> Result<Outcome, CommandError> {
        if args.is_empty() {
            return Err(CommandError::InvalidFormat("no ids given".to_string()));
        }

        let mut ids: Vec<EntryId> = Vec::with_capacity(args.len());
        for raw in args {
            let id = raw
                .parse::<EntryId>()
                .map_err(|_| CommandError::InvalidFormat(format!("{raw:?} is not an id")))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let entries = self.store.find_many_by_ids(&ids, user_id)?;
        let missing: Vec<EntryId> = ids
            .iter()
            .copied()
            .filter(|id| !entries.iter().any(|e| e.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(CommandError::NotFound(missing));
        }

        self.store.delete_entries(&entries)?;
        for entry in &entries {
            tracing::info!(user_id, id = entry.id, "deleted entry");
        }
        Ok(Outcome::Removed { entries })
    }

    fn list<Tz: TimeZone>(
        &mut self,
        args: &[&str],
        at: &DateTime<Tz>,
        user_id: UserId,
    ) -> Result<Outcome, CommandError> {
        let options = parse_list_options(args, at, self.registry)?;
        let window = options.window();

        let entries = match (&options.category, &options.currency) {
            (Some(category), Some(currency)) => self
                .store
                .query_by_category_and_currency(user_id, category, currency, window)?,
            (Some(category), None) => self.store.query_by_category(user_id, category, window)?,
            (None, Some(currency)) => self.store.query_by_currency(user_id, currency, window)?,
            (None, None) => self.store.query_all(user_id, window)?,
        };

        // A currency filter leaves a single currency, so totals need no split.
        let groups = match (options.aggregate, &options.currency) {
            (false, _) => None,
            (true, Some(_)) => Some(aggregate_by_category(&entries)?),
            (true, None) => Some(aggregate_by_category_and_currency(&entries)?),
        };

        Ok(Outcome::Listed {
            options,
            entries,
            groups,
        })
    }

    fn config(&mut self, args: &[&str], user_id: UserId) -> Result<Outcome, CommandError> {
        let subcommand = args.first().map(|s| s.to_lowercase());
        match (subcommand.as_deref(), &args[args.len().min(1)..]) {
            (None | Some("show"), []) => {
                let user = self.store.get_or_create_user(user_id)?;
                Ok(Outcome::Config {
                    user,
                    changed: false,
                })
            }
            (Some("set-default-currency"), [code]) => {
                let currency = self
                    .registry
                    .resolve_currency(code)
                    .ok_or_else(|| CommandError::InvalidCurrency(code.to_string()))?;
                let mut user = self.store.get_or_create_user(user_id)?;
                user.preferred_currency = currency.code.to_string();
                self.store.update_user(&user)?;
                tracing::info!(user_id, currency = currency.code, "default currency updated");
                Ok(Outcome::Config {
                    user,
                    changed: true,
                })
            }
            _ => Err(CommandError::InvalidFormat(format!(
                "unsupported config arguments {args:?}"
            ))),
        }
    }
}
