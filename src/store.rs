use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub type EntryId = i64;
pub type UserId = i64;

/// A ledger entry as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub user_id: UserId,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
}

/// A ledger entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: UserId,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
}

impl NewEntry {
    pub fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            user_id: self.user_id,
            category: self.category,
            amount: self.amount,
            currency: self.currency,
            notes: self.notes,
            timestamp: self.timestamp,
            hash: self.hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub preferred_currency: String,
}

/// Inclusive time window `[from, to]` plus a row limit for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The unique index on entry hashes rejected a write.
    #[error("an entry with the same hash already exists")]
    DuplicateHash,

    /// A stored row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// What the command handlers need from persistence.
///
/// Every read is scoped to one user. Writes are all-or-nothing. Query
/// results are ordered newest first (timestamp, then id, descending) and
/// bounded by the window on both ends.
pub trait LedgerStore {
    fn create_entries(&mut self, entries: &[NewEntry]) -> Result<Vec<Entry>, StoreError>;

    fn delete_entries(&mut self, entries: &[Entry]) -> Result<(), StoreError>;

    fn find_by_hash(&self, hash: &str, user_id: UserId) -> Result<Option<Entry>, StoreError>;

    fn find_many_by_ids(&self, ids: &[EntryId], user_id: UserId)
    -> Result<Vec<Entry>, StoreError>;

    fn query_all(&self, user_id: UserId, window: Window) -> Result<Vec<Entry>, StoreError>;

    fn query_by_category(
        &self,
        user_id: UserId,
        category: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError>;

    fn query_by_currency(
        &self,
        user_id: UserId,
        currency: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError>;

    fn query_by_category_and_currency(
        &self,
        user_id: UserId,
        category: &str,
        currency: &str,
        window: Window,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Loads the user, creating it with the default preferences on first use.
    fn get_or_create_user(&mut self, user_id: UserId) -> Result<User, StoreError>;

    fn update_user(&mut self, user: &User) -> Result<(), StoreError>;
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;

    /// In-memory store that records the write calls it receives.
    #[derive(Debug)]
    pub struct MemoryStore {
        pub entries: BTreeMap<EntryId, Entry>,
        pub users: BTreeMap<UserId, User>,
        pub default_currency: String,
        pub create_calls: Vec<Vec<NewEntry>>,
        pub delete_calls: Vec<Vec<EntryId>>,
        next_id: EntryId,
    }

    impl MemoryStore {
        pub fn new(default_currency: &str) -> Self {
            Self {
                entries: BTreeMap::new(),
                users: BTreeMap::new(),
                default_currency: default_currency.to_string(),
                create_calls: Vec::new(),
                delete_calls: Vec::new(),
                next_id: 1,
            }
        }

        /// Inserts an entry under a fixed id, bypassing the call log.
        pub fn seed(&mut self, entry: Entry) {
            self.next_id = self.next_id.max(entry.id + 1);
            self.entries.insert(entry.id, entry);
        }

        fn query<F>(&self, user_id: UserId, window: Window, keep: F) -> Vec<Entry>
        where
            F: Fn(&Entry) -> bool,
        {
            let mut out: Vec<Entry> = self
                .entries
                .values()
                .filter(|e| e.user_id == user_id)
                .filter(|e| e.timestamp >= window.from && e.timestamp <= window.to)
                .filter(|e| keep(e))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            out.truncate(window.limit as usize);
            out
        }
    }

    impl LedgerStore for MemoryStore {
        fn create_entries(&mut self, entries: &[NewEntry]) -> Result<Vec<Entry>, StoreError> {
            self.create_calls.push(entries.to_vec());
            if entries
                .iter()
                .any(|n| self.entries.values().any(|e| e.hash == n.hash))
            {
                return Err(StoreError::DuplicateHash);
            }
            let mut created = Vec::with_capacity(entries.len());
            for new_entry in entries {
                let entry = new_entry.clone().into_entry(self.next_id);
                self.next_id += 1;
                self.entries.insert(entry.id, entry.clone());
                created.push(entry);
            }
            Ok(created)
        }

        fn delete_entries(&mut self, entries: &[Entry]) -> Result<(), StoreError> {
            self.delete_calls.push(entries.iter().map(|e| e.id).collect());
            for entry in entries {
                self.entries.remove(&entry.id);
            }
            Ok(())
        }

        fn find_by_hash(&self, hash: &str, user_id: UserId) -> Result<Option<Entry>, StoreError> {
            Ok(self
                .entries
                .values()
                .find(|e| e.hash == hash && e.user_id == user_id)
                .cloned())
        }

        fn find_many_by_ids(
            &self,
            ids: &[EntryId],
            user_id: UserId,
        ) -> Result<Vec<Entry>, StoreError> {
            Ok(ids
                .iter()
                .filter_map(|id| self.entries.get(id))
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect())
        }

        fn query_all(&self, user_id: UserId, window: Window) -> Result<Vec<Entry>, StoreError> {
            Ok(self.query(user_id, window, |_| true))
        }

        fn query_by_category(
            &self,
            user_id: UserId,
            category: &str,
            window: Window,
        ) -> Result<Vec<Entry>, StoreError> {
            Ok(self.query(user_id, window, |e| e.category == category))
        }

        fn query_by_currency(
            &self,
            user_id: UserId,
            currency: &str,
            window: Window,
        ) -> Result<Vec<Entry>, StoreError> {
            Ok(self.query(user_id, window, |e| e.currency == currency))
        }

        fn query_by_category_and_currency(
            &self,
            user_id: UserId,
            category: &str,
            currency: &str,
            window: Window,
        ) -> Result<Vec<Entry>, StoreError> {
            Ok(self.query(user_id, window, |e| {
                e.category == category && e.currency == currency
            }))
        }

        fn get_or_create_user(&mut self, user_id: UserId) -> Result<User, StoreError> {
            let default_currency = self.default_currency.clone();
            Ok(self
                .users
                .entry(user_id)
                .or_insert_with(|| User {
                    id: user_id,
                    preferred_currency: default_currency,
                })
                .clone())
        }

        fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
            self.users.insert(user.id, user.clone());
            Ok(())
        }
    }
}
