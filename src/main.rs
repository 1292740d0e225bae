mod add;
mod aggregate;
mod alias;
mod amount;
mod cli;
mod config;
mod cycle;
mod db;
mod dispatch;
mod error;
mod hash;
mod help;
mod list;
mod reply;
mod store;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, Local};
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

use crate::alias::AliasRegistry;
use crate::cli::{Cli, Command, prepare_message};
use crate::config::{app_paths, load_or_init_config};
use crate::db::SqliteStore;
use crate::dispatch::Dispatcher;
use crate::reply::render;
use crate::store::{LedgerStore, UserId};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let registry = AliasRegistry::standard();
    let paths = app_paths(cli.home.clone())?;
    let (cfg, cfg_path) = load_or_init_config(&paths, &registry)?;
    init_tracing(&cfg.log_filter);
    tracing::debug!(config = %cfg_path.display(), "loaded config");

    let (mut store, db_path) = SqliteStore::open(&paths, &cfg.default_currency)?;
    tracing::debug!(db = %db_path.display(), "opened ledger");

    let user_id = cli.user.unwrap_or(cfg.default_user);
    let mut dispatcher =
        Dispatcher::new(&mut store, &registry).with_dedup_window(cfg.dedup_window());

    match cli.command {
        Command::Exec(args) => {
            let at = parse_rfc3339_or_now(args.at.as_deref())?;
            let message = args.message.join(" ");
            let text = prepare_message(&message).map_err(|msg| anyhow!(msg))?;

            let reply = dispatcher.dispatch(text, &at, user_id);
            if let Some(msg) = reply.user_error() {
                return Err(anyhow!(msg));
            }
            println!("{}", render(&reply, &at.timezone()));
        }
        Command::Repl => repl(&mut dispatcher, user_id)?,
    }
    Ok(())
}

fn repl<S: LedgerStore>(dispatcher: &mut Dispatcher<'_, S>, user_id: UserId) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let at = now_local();
        let out = match prepare_message(&line) {
            Ok(text) => render(&dispatcher.dispatch(text, &at, user_id), &at.timezone()),
            Err(msg) => msg,
        };
        writeln!(stdout, "{out}")?;
        stdout.flush().ok();
    }
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn now_local() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

fn parse_rfc3339_or_now(raw: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match raw {
        None => Ok(now_local()),
        Some(s) => {
            DateTime::parse_from_rfc3339(s).with_context(|| format!("Invalid RFC3339 timestamp: {s}"))
        }
    }
}
