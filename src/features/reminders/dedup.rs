//! Per-(user, slot) record of the last day a reminder went out.
//!
//! The scheduler only talks to [`DedupStore`]; the in-memory store forgets
//! everything on restart, the SQLite store survives it.

use crate::core::VocabResult;
use crate::database::{format_timestamp, Database};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use log::debug;
use sqlite::State;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Morning,
    Evening,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Morning, Slot::Evening];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Morning => "morning",
            Slot::Evening => "evening",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait DedupStore: Send + Sync {
    /// True if the slot was already sent on `date`
    async fn was_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<bool>;

    async fn mark_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<()>;

    /// Drop entries recorded before `date`; returns how many were removed
    async fn purge_before(&self, date: NaiveDate) -> VocabResult<usize>;
}

#[derive(Default)]
pub struct InMemoryDedupStore {
    sent: DashMap<(i64, Slot), NaiveDate>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn was_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<bool> {
        Ok(self
            .sent
            .get(&(user_id, slot))
            .map(|entry| *entry.value() == date)
            .unwrap_or(false))
    }

    async fn mark_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<()> {
        self.sent.insert((user_id, slot), date);
        Ok(())
    }

    async fn purge_before(&self, date: NaiveDate) -> VocabResult<usize> {
        let before = self.sent.len();
        self.sent.retain(|_, sent_on| *sent_on >= date);
        Ok(before - self.sent.len())
    }
}

/// Dedup entries in the `reminder_log` table
#[derive(Clone)]
pub struct SqliteDedupStore {
    database: Database,
}

impl SqliteDedupStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl DedupStore for SqliteDedupStore {
    async fn was_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<bool> {
        let sent_on = date.format(DATE_FORMAT).to_string();
        self.database
            .call(|conn| {
                let mut statement = conn.prepare(
                    "SELECT 1 FROM reminder_log WHERE user_id = ? AND slot = ? AND sent_on = ?",
                )?;
                statement.bind((1, user_id))?;
                statement.bind((2, slot.as_str()))?;
                statement.bind((3, sent_on.as_str()))?;
                Ok(matches!(statement.next()?, State::Row))
            })
            .await
    }

    async fn mark_sent(&self, user_id: i64, slot: Slot, date: NaiveDate) -> VocabResult<()> {
        let sent_on = date.format(DATE_FORMAT).to_string();
        let sent_at = format_timestamp(Utc::now());
        self.database
            .call(|conn| {
                let mut statement = conn.prepare(
                    "INSERT OR REPLACE INTO reminder_log (user_id, slot, sent_on, sent_at)
                     VALUES (?, ?, ?, ?)",
                )?;
                statement.bind((1, user_id))?;
                statement.bind((2, slot.as_str()))?;
                statement.bind((3, sent_on.as_str()))?;
                statement.bind((4, sent_at.as_str()))?;
                statement.next()?;
                Ok(())
            })
            .await
    }

    async fn purge_before(&self, date: NaiveDate) -> VocabResult<usize> {
        let cutoff = date.format(DATE_FORMAT).to_string();
        let removed = self
            .database
            .call(|conn| {
                let mut statement = conn.prepare("DELETE FROM reminder_log WHERE sent_on < ?")?;
                statement.bind((1, cutoff.as_str()))?;
                statement.next()?;

                let mut changes = conn.prepare("SELECT changes()")?;
                changes.next()?;
                Ok(changes.read::<i64, _>(0)? as usize)
            })
            .await?;
        if removed > 0 {
            debug!("Purged {removed} reminder log entries before {cutoff}");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    async fn exercise(store: &dyn DedupStore) {
        assert!(!store.was_sent(1, Slot::Morning, day(10)).await.unwrap());
        store.mark_sent(1, Slot::Morning, day(10)).await.unwrap();
        assert!(store.was_sent(1, Slot::Morning, day(10)).await.unwrap());
        assert!(!store.was_sent(1, Slot::Evening, day(10)).await.unwrap());
        assert!(!store.was_sent(2, Slot::Morning, day(10)).await.unwrap());
        assert!(!store.was_sent(1, Slot::Morning, day(11)).await.unwrap());

        store.mark_sent(2, Slot::Evening, day(11)).await.unwrap();
        assert_eq!(store.purge_before(day(11)).await.unwrap(), 1);
        assert!(!store.was_sent(1, Slot::Morning, day(10)).await.unwrap());
        assert!(store.was_sent(2, Slot::Evening, day(11)).await.unwrap());
        assert_eq!(store.purge_before(day(11)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryDedupStore::new();
        exercise(&store).await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteDedupStore::new(Database::in_memory().await.unwrap());
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_mark_sent_replaces_previous_day() {
        let store = SqliteDedupStore::new(Database::in_memory().await.unwrap());
        store.mark_sent(1, Slot::Morning, day(10)).await.unwrap();
        store.mark_sent(1, Slot::Morning, day(11)).await.unwrap();
        assert!(!store.was_sent(1, Slot::Morning, day(10)).await.unwrap());
        assert!(store.was_sent(1, Slot::Morning, day(11)).await.unwrap());
    }
}
