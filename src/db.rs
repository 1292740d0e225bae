use crate::config::AppPaths;
use crate::store::{Entry, EntryId, LedgerStore, NewEntry, StoreError, User, UserId, Window};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, Row, ToSql, params, params_from_iter};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;

const ENTRY_COLUMNS: &str = "id, user_id, category, amount, currency, notes, timestamp, hash";

pub struct SqliteStore {
    conn: Connection,
    default_currency: String,
}

impl SqliteStore {
    pub fn open(paths: &AppPaths, default_currency: &str) -> Result<(Self, PathBuf)> {
        fs::create_dir_all(&paths.data_dir)
            .with_context(|| format!("Failed to create data dir {}", paths.data_dir.display()))?;

        let db_path = paths.data_dir.join("tally.sqlite3");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open DB {}", db_path.display()))?;

        let store = Self::from_connection(conn, default_currency)?;
        Ok((store, db_path))
    }

    pub fn from_connection(conn: Connection, default_currency: &str) -> Result<Self> {
        let store = Self {
            conn,
            default_currency: default_currency.to_string(),
        };
        store.migrate().context("Failed to migrate DB")?;
        Ok(store)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                preferred_currency TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                notes TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                hash TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_hash ON entries(hash);
            CREATE INDEX IF NOT EXISTS idx_entries_user_ts ON entries(user_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_entries_category ON entries(category);
            CREATE INDEX IF NOT EXISTS idx_entries_currency ON entries(currency);
            "#,
        )
    }

    fn query_window(
        &self,
        user_id: UserId,
        filters: &[(&str, &str)],
        window: Window,
    ) -> Result<Vec<Entry>, StoreError> {
        let filter_sql: String = filters
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!(" AND {column} = ?{}", i + 5))
            .collect();
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE user_id = ?1
              AND timestamp >= ?2
              AND timestamp <= ?3
              {filter_sql}
            ORDER BY timestamp DESC, id DESC
            LIMIT ?4
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let from = encode_timestamp(window.from);
        let to = encode_timestamp(window.to);
        let limit = i64::from(window.limit);
        let mut args: Vec<&dyn ToSql> = vec![&user_id, &from, &to, &limit];
        for (_, value) in filters {
            args.push(value);
        }
        let rows = stmt.query_map(args.as_slice(), raw_entry)?;
        decode_rows(rows)
    }
}

/// Fixed-width UTC text so that string order equals time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

type RawEntry = (EntryId, UserId, String, String, String, String, String, String);

fn raw_entry(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_entry(raw: RawEntry) -> Result<Entry, StoreError> {
    let (id, user_id, category, amount, currency, notes, timestamp, hash) = raw;
    let amount = amount
        .parse::<Decimal>()
        .map_err(|_| StoreError::Corrupt(format!("entry {id}: invalid amount {amount:?}")))?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|_| StoreError::Corrupt(format!("entry {id}: invalid timestamp {timestamp:?}")))?
        .with_timezone(&Utc);

    Ok(Entry {
        id,
        user_id,
        category,
        amount,
        currency,
        notes,
        timestamp,
        hash,
    })
}

fn decode_rows<I>(rows: I) -> Result<Vec<Entry>, StoreError>
where
    I: Iterator<Item = rusqlite::Result<RawEntry>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(decode_entry(row?)?);
    }
    Ok(out)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl LedgerStore for SqliteStore {
    fn create_entries(&mut self, entries: &[NewEntry]) -> Result<Vec<Entry>, StoreError> {
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(entries.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO entries (user_id, category, amount, currency, notes, timestamp, hash)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for entry in entries {
                let inserted = stmt.insert(params![
                    entry.user_id,
                    entry.category,
                    entry.amount.to_string(),
                    entry.currency,
                    entry.notes,
                    encode_timestamp(entry.timestamp),
                    entry.hash,
                ]);
                match inserted {
                    Ok(id) => created.push(entry.clone().into_entry(id)),
                    Err(err) if is_unique_violation(&err) => return Err(StoreError::DuplicateHash),
                    Err(err) => return Err(err.into()),
                }
            }
        }
        tx.commit()?;
        Ok(created)
    }

    fn delete_entries(&mut self, entries: &[Entry]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM entries WHERE id = ?1 AND user_id = ?2")?;
            for entry in entries {
                stmt.execute(params![entry.id, entry.user_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_by_hash(&self, hash: &str, user_id: UserId) -> Result<Option<Entry>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE hash = ?1 AND user_id = ?2 LIMIT 1"
        ))?;
        let rows = stmt.query_map(params![hash, user_id], raw_entry)?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    fn find_many_by_ids(
        &self,
        ids: &[EntryId],
        user_id: UserId,
    ) -> Result<Vec<Entry>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = ? AND id IN ({placeholders}) ORDER BY id"
        ))?;
        let params = std::iter::once(user_id).chain(ids.iter().copied());
        let rows = stmt.query_map(params_from_iter(params), raw_entry)?;
        decode_rows(rows)
    }

    fn query_all(&self, user_id: UserId, window: Window) -> Result<Vec<Entry>, StoreError> {
        self.query_window(user_id, &[], window)
    }

    fn query_by_category(
        &self,
        user_id: UserId,
        category: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError> {
        self.query_window(user_id, &[("category", category)], window)
    }

    fn query_by_currency(
        &self,
        user_id: UserId,
        currency: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError> {
        self.query_window(user_id, &[("currency", currency)], window)
    }

    fn query_by_category_and_currency(
        &self,
        user_id: UserId,
        category: &str,
        currency: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError> {
        self.query_window(
            user_id,
            &[("category", category), ("currency", currency)],
            window,
        )
    }

    fn get_or_create_user(&mut self, user_id: UserId) -> Result<User, StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (id, preferred_currency) VALUES (?1, ?2)",
            params![user_id, self.default_currency],
        )?;
        let preferred_currency: String = self.conn.query_row(
            "SELECT preferred_currency FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(User {
            id: user_id,
            preferred_currency,
        })
    }

    fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, preferred_currency) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET preferred_currency = excluded.preferred_currency
            "#,
            params![user.id, user.preferred_currency],
        )?;
        Ok(())
    }
}
