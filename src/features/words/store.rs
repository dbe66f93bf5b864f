//! # Word Store
//!
//! Per-user vocabulary persistence and review bookkeeping.
//!
//! Writes return explicit errors so callers can tell the user what went
//! wrong. Reads log failures and degrade to an empty result.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Random sample, single-word lookup and word count
//! - 1.1.0: Review tracking (last_reviewed_at, review_count, difficulty)
//! - 1.0.0: Add, list and delete words

use super::models::{
    adjust_difficulty, clamp_difficulty, ReminderStats, Word, MAX_ENGLISH_LEN, MAX_RUSSIAN_LEN,
    MAX_TOPIC_LEN, MAX_TRANSCRIPTION_LEN,
};
use crate::core::{ensure_user_id, VocabError, VocabResult};
use crate::database::{format_timestamp, parse_timestamp, Database};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use log::{error, info, warn};
use sqlite::{Connection, State, Statement};

const WORD_COLUMNS: &str =
    "english, russian, transcription, topic, created_at, last_reviewed_at, review_count, difficulty";

/// Vocabulary repository
#[derive(Clone)]
pub struct WordStore {
    database: Database,
    /// Timezone that defines "today" for review statistics
    offset: FixedOffset,
}

impl WordStore {
    pub fn new(database: Database, offset: FixedOffset) -> Self {
        Self { database, offset }
    }

    /// Add a word, replacing any existing entry with the same english key.
    ///
    /// Replacement is a full overwrite: created_at, review_count, difficulty
    /// and last_reviewed_at all start over, so review progress for the word
    /// is lost.
    pub async fn add_word(
        &self,
        user_id: i64,
        english: &str,
        russian: &str,
        transcription: Option<&str>,
        topic: Option<&str>,
    ) -> VocabResult<()> {
        ensure_user_id(user_id)?;
        let english = normalize_english(english);
        let russian = russian.trim().to_string();
        if english.is_empty() || russian.is_empty() {
            warn!("Attempted to add empty word for user {user_id}");
            return Err(VocabError::invalid("english and russian must not be empty"));
        }
        let transcription = non_empty(transcription);
        let topic = non_empty(topic);
        check_len("english", &english, MAX_ENGLISH_LEN)?;
        check_len("russian", &russian, MAX_RUSSIAN_LEN)?;
        if let Some(t) = &transcription {
            check_len("transcription", t, MAX_TRANSCRIPTION_LEN)?;
        }
        if let Some(t) = &topic {
            check_len("topic", t, MAX_TOPIC_LEN)?;
        }
        let created_at = format_timestamp(Utc::now());

        let result = self
            .database
            .call(|conn| {
                let mut statement = conn.prepare(
                    "INSERT OR REPLACE INTO words
                         (user_id, english, russian, transcription, topic, created_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )?;
                statement.bind((1, user_id))?;
                statement.bind((2, english.as_str()))?;
                statement.bind((3, russian.as_str()))?;
                statement.bind((4, transcription.as_deref()))?;
                statement.bind((5, topic.as_deref()))?;
                statement.bind((6, created_at.as_str()))?;
                statement.next()?;
                Ok(())
            })
            .await;

        match result {
            Ok(()) => {
                info!("✅ Word added: {english} - {russian} for user {user_id}");
                Ok(())
            }
            Err(e) => {
                error!("❌ Storage error adding word '{english}' for user {user_id}: {e}");
                Err(e)
            }
        }
    }

    /// All words of a user, newest first
    pub async fn get_user_words(&self, user_id: i64) -> Vec<Word> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        );
        self.read_words(user_id, sql, None, "user words").await
    }

    /// The `limit` most recently added words
    pub async fn get_recent_words(&self, user_id: i64, limit: usize) -> Vec<Word> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        self.read_words(user_id, sql, Some(limit), "recent words").await
    }

    /// Neglected words: never reviewed first, then longest since review, then oldest
    pub async fn get_old_words(&self, user_id: i64, limit: usize) -> Vec<Word> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ?
             ORDER BY CASE WHEN last_reviewed_at IS NULL THEN 0 ELSE 1 END,
                      last_reviewed_at ASC, created_at ASC, id ASC
             LIMIT ?"
        );
        self.read_words(user_id, sql, Some(limit), "old words").await
    }

    /// Hardest words first, least trained first among equals
    pub async fn get_difficult_words(&self, user_id: i64, limit: usize) -> Vec<Word> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ?
             ORDER BY difficulty DESC, review_count ASC, id ASC LIMIT ?"
        );
        self.read_words(user_id, sql, Some(limit), "difficult words").await
    }

    pub async fn get_random_words(&self, user_id: i64, limit: usize) -> Vec<Word> {
        let sql = format!(
            "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ? ORDER BY RANDOM() LIMIT ?"
        );
        self.read_words(user_id, sql, Some(limit), "random words").await
    }

    pub async fn get_word(&self, user_id: i64, english: &str) -> Option<Word> {
        if let Err(e) = ensure_user_id(user_id) {
            warn!("get_word: {e}");
            return None;
        }
        let english = normalize_english(english);
        let result = self
            .database
            .call(|conn| {
                let mut statement = conn.prepare(format!(
                    "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ? AND english = ?"
                ))?;
                statement.bind((1, user_id))?;
                statement.bind((2, english.as_str()))?;
                match statement.next()? {
                    State::Row => Ok(Some(read_word(&statement)?)),
                    State::Done => Ok(None),
                }
            })
            .await;

        result.unwrap_or_else(|e| {
            error!("❌ Storage error looking up '{english}' for user {user_id}: {e}");
            None
        })
    }

    pub async fn word_count(&self, user_id: i64) -> u32 {
        if let Err(e) = ensure_user_id(user_id) {
            warn!("word_count: {e}");
            return 0;
        }
        let result = self
            .database
            .call(|conn| count(conn, "SELECT COUNT(*) FROM words WHERE user_id = ?", user_id))
            .await;

        result.unwrap_or_else(|e| {
            error!("❌ Storage error counting words for user {user_id}: {e}");
            0
        })
    }

    /// Record a review and adapt the word's difficulty.
    ///
    /// Returns the new difficulty.
    pub async fn mark_reviewed(&self, user_id: i64, english: &str, correct: bool) -> VocabResult<u8> {
        ensure_user_id(user_id)?;
        let english = normalize_english(english);
        let reviewed_at = format_timestamp(Utc::now());

        let result = self
            .database
            .call(|conn| {
                let mut select =
                    conn.prepare("SELECT difficulty FROM words WHERE user_id = ? AND english = ?")?;
                select.bind((1, user_id))?;
                select.bind((2, english.as_str()))?;
                let current = match select.next()? {
                    State::Row => clamp_difficulty(select.read::<i64, _>(0)?),
                    State::Done => {
                        return Err(VocabError::not_found(format!(
                            "word '{english}' for user {user_id}"
                        )))
                    }
                };
                drop(select);

                let difficulty = adjust_difficulty(current, correct);
                let mut update = conn.prepare(
                    "UPDATE words
                     SET last_reviewed_at = ?, review_count = review_count + 1, difficulty = ?
                     WHERE user_id = ? AND english = ?",
                )?;
                update.bind((1, reviewed_at.as_str()))?;
                update.bind((2, difficulty as i64))?;
                update.bind((3, user_id))?;
                update.bind((4, english.as_str()))?;
                update.next()?;
                Ok(difficulty)
            })
            .await;

        match &result {
            Ok(difficulty) => info!(
                "✅ Word reviewed: {english} by user {user_id} (correct: {correct}, difficulty: {difficulty})"
            ),
            Err(VocabError::NotFound(what)) => warn!("Review target not found: {what}"),
            Err(e) => error!("❌ Storage error reviewing '{english}' for user {user_id}: {e}"),
        }
        result
    }

    /// Delete a word. `Ok(false)` when there was nothing to delete.
    pub async fn delete_word(&self, user_id: i64, english: &str) -> VocabResult<bool> {
        ensure_user_id(user_id)?;
        let english = normalize_english(english);
        if english.is_empty() {
            return Err(VocabError::invalid("english must not be empty"));
        }

        let result = self
            .database
            .call(|conn| {
                let mut statement =
                    conn.prepare("DELETE FROM words WHERE user_id = ? AND english = ?")?;
                statement.bind((1, user_id))?;
                statement.bind((2, english.as_str()))?;
                statement.next()?;
                drop(statement);

                let mut changes = conn.prepare("SELECT changes()")?;
                changes.next()?;
                Ok(changes.read::<i64, _>(0)? > 0)
            })
            .await;

        match &result {
            Ok(true) => info!("✅ Word deleted: {english} for user {user_id}"),
            Ok(false) => warn!("Word not found: {english} for user {user_id}"),
            Err(e) => error!("❌ Storage error deleting '{english}' for user {user_id}: {e}"),
        }
        result
    }

    /// Review statistics; all-default on failure since this only guides reminders
    pub async fn get_reminder_stats(&self, user_id: i64) -> ReminderStats {
        self.reminder_stats_at(user_id, Utc::now()).await
    }

    pub async fn reminder_stats_at(&self, user_id: i64, now: DateTime<Utc>) -> ReminderStats {
        if let Err(e) = ensure_user_id(user_id) {
            warn!("get_reminder_stats: {e}");
            return ReminderStats::default();
        }
        let (day_start, day_end) = self.local_day_bounds(now);

        let result = self
            .database
            .call(|conn| {
                let total = count(conn, "SELECT COUNT(*) FROM words WHERE user_id = ?", user_id)?;
                let never = count(
                    conn,
                    "SELECT COUNT(*) FROM words WHERE user_id = ? AND last_reviewed_at IS NULL",
                    user_id,
                )?;

                let mut today = conn.prepare(
                    "SELECT COUNT(*) FROM words
                     WHERE user_id = ? AND last_reviewed_at >= ? AND last_reviewed_at < ?",
                )?;
                today.bind((1, user_id))?;
                today.bind((2, day_start.as_str()))?;
                today.bind((3, day_end.as_str()))?;
                today.next()?;
                let reviewed_today = today.read::<i64, _>(0)?.max(0) as u32;
                drop(today);

                let mut avg = conn.prepare("SELECT AVG(difficulty) FROM words WHERE user_id = ?")?;
                avg.bind((1, user_id))?;
                avg.next()?;
                let avg_difficulty = avg.read::<Option<f64>, _>(0)?.unwrap_or(1.0);

                Ok(ReminderStats::new(total, never, reviewed_today, avg_difficulty))
            })
            .await;

        result.unwrap_or_else(|e| {
            error!("❌ Storage error getting reminder stats for user {user_id}: {e}");
            ReminderStats::default()
        })
    }

    /// UTC bounds (as stored text) of the local calendar day containing `now`
    fn local_day_bounds(&self, now: DateTime<Utc>) -> (String, String) {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let start = local_date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.offset.from_local_datetime(&midnight).single())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        (format_timestamp(start), format_timestamp(start + Duration::days(1)))
    }

    async fn read_words(&self, user_id: i64, sql: String, limit: Option<usize>, what: &str) -> Vec<Word> {
        if let Err(e) = ensure_user_id(user_id) {
            warn!("Reading {what}: {e}");
            return Vec::new();
        }

        let result = self
            .database
            .call(|conn| {
                let mut statement = conn.prepare(sql.as_str())?;
                statement.bind((1, user_id))?;
                if let Some(limit) = limit {
                    statement.bind((2, limit as i64))?;
                }
                let mut words = Vec::new();
                while let State::Row = statement.next()? {
                    words.push(read_word(&statement)?);
                }
                Ok(words)
            })
            .await;

        result.unwrap_or_else(|e| {
            error!("❌ Storage error reading {what} for user {user_id}: {e}");
            Vec::new()
        })
    }
}

pub fn normalize_english(english: &str) -> String {
    english.trim().to_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn check_len(field: &str, value: &str, max: usize) -> VocabResult<()> {
    let len = value.chars().count();
    if len > max {
        warn!("Rejected {field} of {len} chars (max {max})");
        return Err(VocabError::invalid(format!("{field} is longer than {max} characters")));
    }
    Ok(())
}

fn count(conn: &Connection, sql: &str, user_id: i64) -> VocabResult<u32> {
    let mut statement = conn.prepare(sql)?;
    statement.bind((1, user_id))?;
    statement.next()?;
    Ok(statement.read::<i64, _>(0)?.max(0) as u32)
}

fn read_word(statement: &Statement<'_>) -> VocabResult<Word> {
    let last_reviewed_at = statement
        .read::<Option<String>, _>("last_reviewed_at")?
        .map(|raw| parse_timestamp(&raw))
        .transpose()?;

    Ok(Word {
        english: statement.read::<String, _>("english")?,
        russian: statement.read::<String, _>("russian")?,
        transcription: statement.read::<Option<String>, _>("transcription")?,
        topic: statement.read::<Option<String>, _>("topic")?,
        created_at: parse_timestamp(&statement.read::<String, _>("created_at")?)?,
        last_reviewed_at,
        review_count: statement.read::<i64, _>("review_count")?.max(0) as u32,
        difficulty: clamp_difficulty(statement.read::<i64, _>("difficulty")?),
    })
}
