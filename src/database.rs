//! # Database
//!
//! SQLite connection, schema and migrations for words, user settings and the
//! reminder log. One thread-safe connection is shared behind an async mutex;
//! every access is bounded by the configured storage timeout.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: reminder_log table for durable reminder dedup
//! - 1.1.0: Column migration for databases created before review tracking
//! - 1.0.0: Initial schema (words, user_settings)

use crate::core::{VocabError, VocabResult};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use sqlite::{Connection, ConnectionThreadSafe, State};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Stored timestamp layout. Fixed width so text order is time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
/// Layout written by SQLite's CURRENT_TIMESTAMP in older databases
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        english TEXT NOT NULL,
        russian TEXT NOT NULL,
        transcription TEXT,
        topic TEXT,
        created_at TEXT NOT NULL,
        last_reviewed_at TEXT,
        review_count INTEGER NOT NULL DEFAULT 0,
        difficulty INTEGER NOT NULL DEFAULT 1,
        UNIQUE(user_id, english)
    );

    CREATE INDEX IF NOT EXISTS idx_words_user ON words(user_id);

    CREATE TABLE IF NOT EXISTS user_settings (
        user_id INTEGER PRIMARY KEY,
        morning_time TEXT NOT NULL DEFAULT '09:00',
        evening_time TEXT NOT NULL DEFAULT '20:00',
        reminders_enabled INTEGER NOT NULL DEFAULT 1,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS reminder_log (
        user_id INTEGER NOT NULL,
        slot TEXT NOT NULL,
        sent_on TEXT NOT NULL,
        sent_at TEXT NOT NULL,
        PRIMARY KEY (user_id, slot)
    );
";

/// Columns added to `words` after the first release, with their DDL
const WORD_COLUMN_MIGRATIONS: &[(&str, &str)] = &[
    ("transcription", "ALTER TABLE words ADD COLUMN transcription TEXT"),
    ("topic", "ALTER TABLE words ADD COLUMN topic TEXT"),
    ("last_reviewed_at", "ALTER TABLE words ADD COLUMN last_reviewed_at TEXT"),
    ("review_count", "ALTER TABLE words ADD COLUMN review_count INTEGER NOT NULL DEFAULT 0"),
    ("difficulty", "ALTER TABLE words ADD COLUMN difficulty INTEGER NOT NULL DEFAULT 1"),
];

/// Shared handle to the bot database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<ConnectionThreadSafe>>,
    timeout: Duration,
}

impl Database {
    /// Open (creating if needed) the database file and bring the schema up to date
    pub async fn new(path: &str) -> Result<Self> {
        Self::with_timeout(path, DEFAULT_STORAGE_TIMEOUT).await
    }

    pub async fn with_timeout(path: &str, timeout: Duration) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }

        let conn = Connection::open_thread_safe(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        Self::initialize(&conn, timeout).context("Failed to initialize database schema")?;
        info!("✅ Database initialized at {path}");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout,
        })
    }

    /// Fresh in-memory database with the full schema
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_thread_safe(":memory:")
            .context("Failed to open in-memory database")?;
        Self::initialize(&conn, DEFAULT_STORAGE_TIMEOUT)
            .context("Failed to initialize database schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout: DEFAULT_STORAGE_TIMEOUT,
        })
    }

    /// `timeout` also bounds how long SQLite waits on a locked database file
    fn initialize(conn: &Connection, timeout: Duration) -> sqlite::Result<()> {
        conn.execute(format!("PRAGMA busy_timeout = {}", timeout.as_millis()))?;
        conn.execute(SCHEMA)?;
        Self::migrate_words(conn)
    }

    /// Add review-tracking columns missing from an older `words` table
    fn migrate_words(conn: &Connection) -> sqlite::Result<()> {
        let mut existing = Vec::new();
        let mut statement = conn.prepare("PRAGMA table_info(words)")?;
        while let State::Row = statement.next()? {
            existing.push(statement.read::<String, _>("name")?);
        }
        drop(statement);

        for (column, ddl) in WORD_COLUMN_MIGRATIONS {
            if !existing.iter().any(|c| c == column) {
                conn.execute(*ddl)?;
                info!("✅ Added column words.{column}");
            }
        }
        Ok(())
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// Waiting for the connection longer than the storage timeout fails with
    /// [`VocabError::Storage`].
    pub async fn call<T, F>(&self, f: F) -> VocabResult<T>
    where
        F: FnOnce(&Connection) -> VocabResult<T>,
    {
        let guard = tokio::time::timeout(self.timeout, self.conn.lock())
            .await
            .map_err(|_| {
                VocabError::Storage(format!(
                    "timed out after {}ms waiting for the database",
                    self.timeout.as_millis()
                ))
            })?;
        debug!("Database connection acquired");
        f(&guard)
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> VocabResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT))?;
    Ok(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_in_memory_schema() {
        let db = Database::in_memory().await.unwrap();
        let tables = db
            .call(|conn| {
                let mut names = Vec::new();
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
                while let State::Row = stmt.next()? {
                    names.push(stmt.read::<String, _>(0)?);
                }
                Ok(names)
            })
            .await
            .unwrap();

        assert!(tables.contains(&"words".to_string()));
        assert!(tables.contains(&"user_settings".to_string()));
        assert!(tables.contains(&"reminder_log".to_string()));
    }

    #[tokio::test]
    async fn test_busy_timeout_follows_configured_timeout() {
        let db = Database::with_timeout(":memory:", Duration::from_millis(1234))
            .await
            .unwrap();
        let busy = db
            .call(|conn| {
                let mut stmt = conn.prepare("PRAGMA busy_timeout")?;
                stmt.next()?;
                Ok(stmt.read::<i64, _>(0)?)
            })
            .await
            .unwrap();
        assert_eq!(busy, 1234);
    }

    #[test]
    fn test_migration_adds_missing_columns() {
        let conn = Connection::open_thread_safe(":memory:").unwrap();
        conn.execute(
            "CREATE TABLE words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                english TEXT NOT NULL,
                russian TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, english)
            );
            INSERT INTO words (user_id, english, russian, created_at)
            VALUES (1, 'cat', 'кот', '2024-01-01 10:00:00');",
        )
        .unwrap();

        Database::initialize(&conn, DEFAULT_STORAGE_TIMEOUT).unwrap();

        let mut stmt = conn
            .prepare("SELECT review_count, difficulty, last_reviewed_at FROM words WHERE english = 'cat'")
            .unwrap();
        assert!(matches!(stmt.next().unwrap(), State::Row));
        assert_eq!(stmt.read::<i64, _>(0).unwrap(), 0);
        assert_eq!(stmt.read::<i64, _>(1).unwrap(), 1);
        assert_eq!(stmt.read::<Option<String>, _>(2).unwrap(), None);
    }

    #[test]
    fn test_timestamp_roundtrip_and_legacy() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-05 07:08:09.000000");
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
        assert_eq!(parse_timestamp("2024-03-05 07:08:09").unwrap(), ts);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
